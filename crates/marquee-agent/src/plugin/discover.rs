//! Discovery tools: browse the catalog by year and genre.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use marquee_catalog::{CatalogError, CatalogGateway, MovieQuery};

use crate::completion::{ToolInvoker, ToolSpec};
use crate::error::ToolError;
use crate::plugin::{object_schema, output, paging_properties, ToolArgs};

pub const DISCOVER_MOVIES: &str = "discover_movies";
pub const LIST_GENRES: &str = "list_genres";

pub struct DiscoverPlugin {
    gateway: Arc<dyn CatalogGateway>,
}

impl DiscoverPlugin {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self { gateway }
    }

    async fn discover(&self, args: &ToolArgs<'_>) -> Result<Value, ToolError> {
        let genre_id = match args.text("genre") {
            Some(name) => Some(
                self.gateway
                    .find_genre(name)
                    .await?
                    .ok_or_else(|| CatalogError::not_found("genre", name))?
                    .id,
            ),
            None => None,
        };
        let query = MovieQuery {
            text: args.text("query").map(str::to_string),
            year: args.int("year").and_then(|y| i32::try_from(y).ok()),
            genre_id,
            paging: args.paging(),
        };
        debug!(year = ?query.year, genre_id = ?query.genre_id, page = query.paging.page, "Discovering movies");
        output(&self.gateway.search_movies(&query).await?)
    }
}

#[async_trait]
impl ToolInvoker for DiscoverPlugin {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: DISCOVER_MOVIES.to_string(),
                description: "Discover catalog movies filtered by release year and/or genre name."
                    .to_string(),
                parameters: object_schema(
                    &[
                        json!({
                            "year": { "type": "integer", "description": "Release year" },
                            "genre": { "type": "string", "description": "Genre name, as returned by list_genres" },
                            "query": { "type": "string", "description": "Optional words from the title" }
                        }),
                        paging_properties(),
                    ],
                    &[],
                ),
            },
            ToolSpec {
                name: LIST_GENRES.to_string(),
                description: "List every genre known to the catalog.".to_string(),
                parameters: object_schema(&[], &[]),
            },
        ]
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let args = ToolArgs::new(&arguments);
        match name {
            DISCOVER_MOVIES => self.discover(&args).await,
            LIST_GENRES => output(&self.gateway.genres().await?),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}
