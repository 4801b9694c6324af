//! Catalog DTOs and paging bounds.

use serde::{Deserialize, Serialize};

/// Smallest page size a tool may request.
pub const PAGE_SIZE_MIN: u32 = 1;
/// Largest page size a tool may request; bounds response token cost.
pub const PAGE_SIZE_MAX: u32 = 10;
/// Page size used when the caller gives none.
pub const PAGE_SIZE_DEFAULT: u32 = 5;

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Local catalog identifier.
    pub id: i64,
    /// Identifier in the external reference catalog.
    pub external_id: i64,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Local catalog identifier.
    pub id: i64,
    /// Identifier in the external reference catalog.
    pub external_id: i64,
    pub name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub known_for: Vec<String>,
}

// =============================================================================
// Queries and pages
// =============================================================================

/// Page coordinates after bounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Paging {
    /// Bound raw tool input: `page` is floored at 1 and `page_size` is
    /// clamped to `PAGE_SIZE_MIN..=PAGE_SIZE_MAX`.
    pub fn bounded(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let page_size = page_size
            .unwrap_or(i64::from(PAGE_SIZE_DEFAULT))
            .clamp(i64::from(PAGE_SIZE_MIN), i64::from(PAGE_SIZE_MAX)) as u32;
        Self { page, page_size }
    }

    /// Zero-based offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.page_size as usize)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::bounded(None, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieQuery {
    pub text: Option<String>,
    pub year: Option<i32>,
    pub genre_id: Option<i64>,
    pub paging: Paging,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonQuery {
    pub text: String,
    pub paging: Paging,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn empty(paging: Paging) -> Self {
        Self {
            items: Vec::new(),
            page: paging.page,
            page_size: paging.page_size,
            total: 0,
        }
    }

    /// Cut one page out of a fully materialized result list.
    pub fn slice(all: Vec<T>, paging: Paging) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(paging.offset())
            .take(paging.page_size as usize)
            .collect();
        Self {
            items,
            page: paging.page,
            page_size: paging.page_size,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_clamps_page_size() {
        assert_eq!(Paging::bounded(Some(1), Some(500)).page_size, PAGE_SIZE_MAX);
        assert_eq!(Paging::bounded(Some(1), Some(0)).page_size, PAGE_SIZE_MIN);
        assert_eq!(Paging::bounded(Some(1), Some(-7)).page_size, PAGE_SIZE_MIN);
        assert_eq!(Paging::bounded(Some(1), Some(7)).page_size, 7);
    }

    #[test]
    fn test_paging_floors_page() {
        assert_eq!(Paging::bounded(Some(-3), None).page, 1);
        assert_eq!(Paging::bounded(Some(0), None).page, 1);
        assert_eq!(Paging::bounded(Some(4), None).page, 4);
    }

    #[test]
    fn test_paging_defaults() {
        let paging = Paging::default();
        assert_eq!(paging.page, 1);
        assert_eq!(paging.page_size, PAGE_SIZE_DEFAULT);
        assert_eq!(paging.offset(), 0);
    }

    #[test]
    fn test_page_slice() {
        let all: Vec<u32> = (0..23).collect();
        let page = Page::slice(all, Paging::bounded(Some(3), Some(10)));
        assert_eq!(page.items, vec![20, 21, 22]);
        assert_eq!(page.total, 23);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_unbounded_page_zero_reads_first_page() {
        let paging: Paging = serde_json::from_str(r#"{"page": 0, "pageSize": 2}"#).unwrap();
        assert_eq!(paging.offset(), 0);
        let page = Page::slice(vec![1, 2, 3], paging);
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn test_page_slice_past_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], Paging::bounded(Some(9), Some(10)));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_movie_serializes_camel_case() {
        let movie = Movie {
            id: 1,
            external_id: 157336,
            title: "Interstellar".into(),
            release_year: Some(2014),
            genres: vec!["Science Fiction".into()],
            overview: String::new(),
            director: Some("Christopher Nolan".into()),
            cast: vec![],
            rating: None,
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["externalId"], 157336);
        assert_eq!(json["releaseYear"], 2014);
    }
}
