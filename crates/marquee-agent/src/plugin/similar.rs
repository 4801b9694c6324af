//! Title lookup and similarity tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use marquee_catalog::{CatalogGateway, Movie, MovieQuery, Page};

use crate::completion::{ToolInvoker, ToolSpec};
use crate::error::ToolError;
use crate::plugin::{
    identifier_properties, object_schema, output, paging_properties, resolve_movie, ToolArgs,
};

pub const SEARCH_MOVIES: &str = "search_movies";
pub const GET_MOVIE: &str = "get_movie";
pub const SIMILAR_MOVIES: &str = "similar_movies";

pub struct SimilarPlugin {
    gateway: Arc<dyn CatalogGateway>,
}

impl SimilarPlugin {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self { gateway }
    }

    async fn search(&self, args: &ToolArgs<'_>) -> Result<Value, ToolError> {
        let paging = args.paging();
        let Some(text) = args.text("query") else {
            return output(&Page::<Movie>::empty(paging));
        };
        let query = MovieQuery {
            text: Some(text.to_string()),
            paging,
            ..MovieQuery::default()
        };
        output(&self.gateway.search_movies(&query).await?)
    }

    async fn similar(&self, args: &ToolArgs<'_>) -> Result<Value, ToolError> {
        // Similarity is keyed by external id; a local id is translated first.
        let external_id = match args.int("externalId") {
            Some(external_id) if args.int("id").is_none() => external_id,
            _ => resolve_movie(self.gateway.as_ref(), args).await?.external_id,
        };
        output(
            &self
                .gateway
                .similar_movies(external_id, args.paging())
                .await?,
        )
    }
}

#[async_trait]
impl ToolInvoker for SimilarPlugin {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: SEARCH_MOVIES.to_string(),
                description: "Search catalog movies by title.".to_string(),
                parameters: object_schema(
                    &[
                        json!({ "query": { "type": "string", "description": "Title or part of a title" } }),
                        paging_properties(),
                    ],
                    &["query"],
                ),
            },
            ToolSpec {
                name: GET_MOVIE.to_string(),
                description: "Get a movie's details by local id or external catalog id. \
                              Unknown external ids are imported on demand."
                    .to_string(),
                parameters: object_schema(&[identifier_properties("movie")], &[]),
            },
            ToolSpec {
                name: SIMILAR_MOVIES.to_string(),
                description: "List movies similar to the given one.".to_string(),
                parameters: object_schema(
                    &[identifier_properties("movie"), paging_properties()],
                    &[],
                ),
            },
        ]
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let args = ToolArgs::new(&arguments);
        match name {
            SEARCH_MOVIES => self.search(&args).await,
            GET_MOVIE => output(&resolve_movie(self.gateway.as_ref(), &args).await?),
            SIMILAR_MOVIES => self.similar(&args).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::testing;

    #[tokio::test]
    async fn test_search_movies_by_title() {
        let plugin = SimilarPlugin::new(testing::catalog());
        let out = plugin
            .invoke(SEARCH_MOVIES, json!({"query": "inter"}))
            .await
            .unwrap();
        assert_eq!(out["items"][0]["title"], "Interstellar");
    }

    #[tokio::test]
    async fn test_blank_search_skips_gateway() {
        let catalog = testing::catalog();
        let plugin = SimilarPlugin::new(catalog.clone());
        let out = plugin.invoke(SEARCH_MOVIES, json!({})).await.unwrap();
        assert_eq!(out["items"].as_array().unwrap().len(), 0);
        assert_eq!(catalog.call_count(), 0);
    }

    #[tokio::test]
    async fn test_similar_by_external_id() {
        let plugin = SimilarPlugin::new(testing::catalog());
        let out = plugin
            .invoke(SIMILAR_MOVIES, json!({"externalId": 157336, "pageSize": 1}))
            .await
            .unwrap();
        assert_eq!(out["pageSize"], 1);
        assert_eq!(out["items"].as_array().unwrap().len(), 1);
        assert_ne!(out["items"][0]["externalId"], 157336);
    }

    #[tokio::test]
    async fn test_similar_by_local_id() {
        let plugin = SimilarPlugin::new(testing::catalog());
        let by_id = plugin
            .invoke(SIMILAR_MOVIES, json!({"id": 2}))
            .await
            .unwrap();
        let by_external = plugin
            .invoke(SIMILAR_MOVIES, json!({"externalId": 27205}))
            .await
            .unwrap();
        assert_eq!(by_id, by_external);
    }

    #[tokio::test]
    async fn test_similar_requires_identifier() {
        let plugin = SimilarPlugin::new(testing::catalog());
        assert!(plugin.invoke(SIMILAR_MOVIES, json!({"page": 2})).await.is_err());
    }

    #[tokio::test]
    async fn test_get_movie_imports_remote() {
        let catalog = testing::catalog();
        let plugin = SimilarPlugin::new(catalog.clone());
        let out = plugin
            .invoke(GET_MOVIE, json!({"externalId": "603"}))
            .await
            .unwrap();
        assert_eq!(out["title"], "The Matrix");
        assert_eq!(out["id"], 6);
        assert_eq!(catalog.import_count(), 1);
    }
}
