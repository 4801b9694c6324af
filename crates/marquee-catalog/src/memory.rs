//! In-memory catalog gateway.
//!
//! Holds the local catalog plus a "remote" reference catalog that
//! `ensure_*` imports from on demand. Used by the binary when no backend is
//! wired in, and by tests throughout the workspace.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use marquee_core::error::Result as CoreResult;

use crate::error::CatalogError;
use crate::gateway::CatalogGateway;
use crate::types::{Genre, Movie, MovieQuery, Page, Paging, Person, PersonQuery};

/// JSON seed for [`InMemoryCatalog`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogSeed {
    pub genres: Vec<Genre>,
    pub movies: Vec<Movie>,
    pub people: Vec<Person>,
    /// Records known to the external catalog but not yet imported.
    pub remote_movies: Vec<Movie>,
    pub remote_people: Vec<Person>,
}

impl CatalogSeed {
    /// Load a seed from a JSON file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let seed: CatalogSeed = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            movies = seed.movies.len(),
            people = seed.people.len(),
            "Catalog seed loaded"
        );
        Ok(seed)
    }
}

#[derive(Default)]
struct CatalogState {
    genres: Vec<Genre>,
    movies: Vec<Movie>,
    people: Vec<Person>,
}

/// Catalog gateway backed by in-process vectors.
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
    remote_movies: Vec<Movie>,
    remote_people: Vec<Person>,
    imports: AtomicUsize,
    calls: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::from_seed(CatalogSeed::default())
    }

    pub fn from_seed(seed: CatalogSeed) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                genres: seed.genres,
                movies: seed.movies,
                people: seed.people,
            }),
            remote_movies: seed.remote_movies,
            remote_people: seed.remote_people,
            imports: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Build from an optional seed file; a missing path gives an empty catalog.
    pub fn from_seed_path(path: Option<&Path>) -> CoreResult<Self> {
        match path {
            Some(p) => Ok(Self::from_seed(CatalogSeed::load(p)?)),
            None => Ok(Self::new()),
        }
    }

    /// Number of imports performed by `ensure_*`.
    pub fn import_count(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }

    /// Number of gateway operations served.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogState>, CatalogError> {
        self.state
            .read()
            .map_err(|e| CatalogError::Unavailable(format!("catalog lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, CatalogState>, CatalogError> {
        self.state
            .write()
            .map_err(|e| CatalogError::Unavailable(format!("catalog lock poisoned: {}", e)))
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn next_id<I: Iterator<Item = i64>>(ids: I) -> i64 {
    ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn search_movies(&self, query: &MovieQuery) -> Result<Page<Movie>, CatalogError> {
        self.touch();
        let state = self.read()?;
        let genre_name = match query.genre_id {
            Some(id) => Some(
                state
                    .genres
                    .iter()
                    .find(|g| g.id == id)
                    .map(|g| g.name.clone())
                    .ok_or_else(|| CatalogError::not_found("genre", id))?,
            ),
            None => None,
        };
        let text = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let mut matches: Vec<Movie> = state
            .movies
            .iter()
            .filter(|m| text.map_or(true, |t| contains_ci(&m.title, t)))
            .filter(|m| query.year.map_or(true, |y| m.release_year == Some(y)))
            .filter(|m| {
                genre_name
                    .as_deref()
                    .map_or(true, |g| m.genres.iter().any(|mg| mg.eq_ignore_ascii_case(g)))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(Page::slice(matches, query.paging))
    }

    async fn search_people(&self, query: &PersonQuery) -> Result<Page<Person>, CatalogError> {
        self.touch();
        let state = self.read()?;
        let mut matches: Vec<Person> = state
            .people
            .iter()
            .filter(|p| contains_ci(&p.name, query.text.trim()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::slice(matches, query.paging))
    }

    async fn get_movie(&self, id: i64) -> Result<Movie, CatalogError> {
        self.touch();
        self.read()?
            .movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("movie", id))
    }

    async fn get_person(&self, id: i64) -> Result<Person, CatalogError> {
        self.touch();
        self.read()?
            .people
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("person", id))
    }

    async fn ensure_movie(&self, external_id: i64) -> Result<Movie, CatalogError> {
        self.touch();
        let mut state = self.write()?;
        if let Some(existing) = state.movies.iter().find(|m| m.external_id == external_id) {
            return Ok(existing.clone());
        }
        let remote = self
            .remote_movies
            .iter()
            .find(|m| m.external_id == external_id)
            .ok_or_else(|| CatalogError::not_found("movie", format!("external {}", external_id)))?;

        let mut imported = remote.clone();
        imported.id = next_id(state.movies.iter().map(|m| m.id));
        state.movies.push(imported.clone());
        self.imports.fetch_add(1, Ordering::SeqCst);
        debug!(external_id, id = imported.id, "Imported movie");
        Ok(imported)
    }

    async fn ensure_person(&self, external_id: i64) -> Result<Person, CatalogError> {
        self.touch();
        let mut state = self.write()?;
        if let Some(existing) = state.people.iter().find(|p| p.external_id == external_id) {
            return Ok(existing.clone());
        }
        let remote = self
            .remote_people
            .iter()
            .find(|p| p.external_id == external_id)
            .ok_or_else(|| {
                CatalogError::not_found("person", format!("external {}", external_id))
            })?;

        let mut imported = remote.clone();
        imported.id = next_id(state.people.iter().map(|p| p.id));
        state.people.push(imported.clone());
        self.imports.fetch_add(1, Ordering::SeqCst);
        debug!(external_id, id = imported.id, "Imported person");
        Ok(imported)
    }

    async fn genres(&self) -> Result<Vec<Genre>, CatalogError> {
        self.touch();
        Ok(self.read()?.genres.clone())
    }

    async fn find_genre(&self, name: &str) -> Result<Option<Genre>, CatalogError> {
        self.touch();
        let name = name.trim();
        Ok(self
            .read()?
            .genres
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn similar_movies(
        &self,
        external_id: i64,
        paging: Paging,
    ) -> Result<Page<Movie>, CatalogError> {
        self.touch();
        let state = self.read()?;
        let source = state
            .movies
            .iter()
            .chain(self.remote_movies.iter())
            .find(|m| m.external_id == external_id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("movie", format!("external {}", external_id)))?;

        let shared = |m: &Movie| {
            m.genres
                .iter()
                .filter(|g| source.genres.iter().any(|sg| sg.eq_ignore_ascii_case(g)))
                .count()
        };
        let mut scored: Vec<(usize, Movie)> = state
            .movies
            .iter()
            .filter(|m| m.external_id != external_id)
            .map(|m| (shared(m), m.clone()))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.title.cmp(&b.1.title)));
        Ok(Page::slice(
            scored.into_iter().map(|(_, m)| m).collect(),
            paging,
        ))
    }
}
