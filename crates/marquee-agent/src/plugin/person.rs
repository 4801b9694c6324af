//! Person lookup tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use marquee_catalog::{CatalogGateway, Page, Person, PersonQuery};

use crate::completion::{ToolInvoker, ToolSpec};
use crate::error::ToolError;
use crate::plugin::{
    identifier_properties, object_schema, output, paging_properties, resolve_person, ToolArgs,
};

pub const SEARCH_PEOPLE: &str = "search_people";
pub const GET_PERSON: &str = "get_person";

pub struct PersonPlugin {
    gateway: Arc<dyn CatalogGateway>,
}

impl PersonPlugin {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self { gateway }
    }

    async fn search(&self, args: &ToolArgs<'_>) -> Result<Value, ToolError> {
        let paging = args.paging();
        let Some(text) = args.text("query") else {
            return output(&Page::<Person>::empty(paging));
        };
        let query = PersonQuery {
            text: text.to_string(),
            paging,
        };
        output(&self.gateway.search_people(&query).await?)
    }
}

#[async_trait]
impl ToolInvoker for PersonPlugin {
    fn specs(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: SEARCH_PEOPLE.to_string(),
                description: "Search actors, directors and other crew by name.".to_string(),
                parameters: object_schema(
                    &[
                        json!({ "query": { "type": "string", "description": "Name or part of a name" } }),
                        paging_properties(),
                    ],
                    &["query"],
                ),
            },
            ToolSpec {
                name: GET_PERSON.to_string(),
                description: "Get a person's details by local id or external catalog id. \
                              Unknown external ids are imported on demand."
                    .to_string(),
                parameters: object_schema(&[identifier_properties("person")], &[]),
            },
        ]
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let args = ToolArgs::new(&arguments);
        match name {
            SEARCH_PEOPLE => self.search(&args).await,
            GET_PERSON => output(&resolve_person(self.gateway.as_ref(), &args).await?),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::testing;

    #[tokio::test]
    async fn test_search_people() {
        let plugin = PersonPlugin::new(testing::catalog());
        let out = plugin
            .invoke(SEARCH_PEOPLE, json!({"query": "nolan"}))
            .await
            .unwrap();
        assert_eq!(out["total"], 1);
        assert_eq!(out["items"][0]["externalId"], 525);
    }

    #[tokio::test]
    async fn test_blank_query_skips_gateway() {
        let catalog = testing::catalog();
        let plugin = PersonPlugin::new(catalog.clone());
        let out = plugin
            .invoke(SEARCH_PEOPLE, json!({"query": "   ", "pageSize": 500}))
            .await
            .unwrap();
        assert_eq!(out["total"], 0);
        assert_eq!(out["pageSize"], 10);
        assert_eq!(catalog.call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_person_by_external_id_imports_once() {
        let catalog = testing::catalog();
        let plugin = PersonPlugin::new(catalog.clone());
        let out = plugin
            .invoke(GET_PERSON, json!({"externalId": 6384}))
            .await
            .unwrap();
        assert_eq!(out["name"], "Keanu Reeves");
        assert_eq!(catalog.import_count(), 1);
    }

    #[tokio::test]
    async fn test_get_person_requires_identifier() {
        let plugin = PersonPlugin::new(testing::catalog());
        let err = plugin.invoke(GET_PERSON, json!({})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "catalog error: invalid argument: person requires either id or externalId"
        );
    }
}
