//! Catalog gateway for marquee.
//!
//! Defines the command/query contract the assistant's tools call into,
//! the DTOs exchanged across it, and an in-memory implementation.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod types;

pub use error::CatalogError;
pub use gateway::CatalogGateway;
pub use memory::{CatalogSeed, InMemoryCatalog};
pub use types::{
    Genre, Movie, MovieQuery, Page, Paging, Person, PersonQuery, PAGE_SIZE_DEFAULT,
    PAGE_SIZE_MAX, PAGE_SIZE_MIN,
};
