//! Command/query surface of the catalog backend.
//!
//! The assistant never touches catalog storage directly; every lookup and
//! import goes through a `CatalogGateway`. Implementations may be shared
//! across requests and are responsible for their own pooling.

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::types::{Genre, Movie, MovieQuery, Page, Paging, Person, PersonQuery};

/// Catalog gateway consumed by the tool plugins.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Paged movie search filtered by free text, release year and genre.
    async fn search_movies(&self, query: &MovieQuery) -> Result<Page<Movie>, CatalogError>;

    /// Paged person search by name.
    async fn search_people(&self, query: &PersonQuery) -> Result<Page<Person>, CatalogError>;

    /// Fetch a movie by its local identifier.
    async fn get_movie(&self, id: i64) -> Result<Movie, CatalogError>;

    /// Fetch a person by their local identifier.
    async fn get_person(&self, id: i64) -> Result<Person, CatalogError>;

    /// Return the local movie for an external id, importing it first if needed.
    ///
    /// Idempotent: a second call for the same id never imports again.
    async fn ensure_movie(&self, external_id: i64) -> Result<Movie, CatalogError>;

    /// Return the local person for an external id, importing them first if needed.
    async fn ensure_person(&self, external_id: i64) -> Result<Person, CatalogError>;

    async fn genres(&self) -> Result<Vec<Genre>, CatalogError>;

    /// Case-insensitive exact lookup of a genre by name.
    async fn find_genre(&self, name: &str) -> Result<Option<Genre>, CatalogError>;

    /// Movies similar to the one identified by `external_id`.
    async fn similar_movies(
        &self,
        external_id: i64,
        paging: Paging,
    ) -> Result<Page<Movie>, CatalogError>;
}
