//! Tool plugins exposing a bounded slice of the catalog gateway.
//!
//! Every plugin follows the same rules:
//! - `pageSize` is clamped to `1..=10` and `page` is floored at 1.
//! - Tools addressing an entity accept `id` (local) or `externalId`. The
//!   local id wins; otherwise the entity is ensured through the idempotent
//!   import; with neither the call fails with `InvalidArguments`.
//! - Blank free-text queries return an empty page without touching the
//!   gateway.

pub mod discover;
pub mod person;
pub mod similar;

use serde::Serialize;
use serde_json::{json, Value};

use marquee_catalog::{CatalogError, CatalogGateway, Movie, Paging, Person};

use crate::error::ToolError;

pub use discover::DiscoverPlugin;
pub use person::PersonPlugin;
pub use similar::SimilarPlugin;

/// Read-only view over the JSON arguments of one tool call.
pub struct ToolArgs<'a> {
    data: &'a Value,
}

impl<'a> ToolArgs<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self { data }
    }

    /// Trimmed string argument; blank counts as absent.
    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.data
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Integer argument. Models often quote numbers, so numeric strings count.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.data.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn paging(&self) -> Paging {
        Paging::bounded(self.int("page"), self.int("pageSize"))
    }
}

/// Resolve a movie from `id` or `externalId`.
pub async fn resolve_movie(
    gateway: &dyn CatalogGateway,
    args: &ToolArgs<'_>,
) -> Result<Movie, ToolError> {
    if let Some(id) = args.int("id") {
        return Ok(gateway.get_movie(id).await?);
    }
    if let Some(external_id) = args.int("externalId") {
        return Ok(gateway.ensure_movie(external_id).await?);
    }
    Err(missing_identifier("movie"))
}

/// Resolve a person from `id` or `externalId`.
pub async fn resolve_person(
    gateway: &dyn CatalogGateway,
    args: &ToolArgs<'_>,
) -> Result<Person, ToolError> {
    if let Some(id) = args.int("id") {
        return Ok(gateway.get_person(id).await?);
    }
    if let Some(external_id) = args.int("externalId") {
        return Ok(gateway.ensure_person(external_id).await?);
    }
    Err(missing_identifier("person"))
}

fn missing_identifier(entity: &str) -> ToolError {
    CatalogError::InvalidArgument(format!("{} requires either id or externalId", entity)).into()
}

pub(crate) fn output<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(value)?)
}

pub(crate) fn paging_properties() -> Value {
    json!({
        "page": { "type": "integer", "description": "1-based page number", "minimum": 1 },
        "pageSize": { "type": "integer", "description": "Results per page (1-10)", "minimum": 1, "maximum": 10 }
    })
}

pub(crate) fn identifier_properties(entity: &str) -> Value {
    json!({
        "id": { "type": "integer", "description": format!("Local {} id", entity) },
        "externalId": { "type": "integer", "description": format!("External catalog {} id", entity) }
    })
}

/// Merge several `properties` objects into one JSON-schema object.
pub(crate) fn object_schema(parts: &[Value], required: &[&str]) -> Value {
    let mut properties = serde_json::Map::new();
    for part in parts {
        if let Some(map) = part.as_object() {
            properties.extend(map.clone());
        }
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use marquee_catalog::{CatalogSeed, InMemoryCatalog};

    pub fn catalog() -> Arc<InMemoryCatalog> {
        let seed: CatalogSeed =
            serde_json::from_str(include_str!("../../../../data/catalog.json")).unwrap();
        Arc::new(InMemoryCatalog::from_seed(seed))
    }
}
