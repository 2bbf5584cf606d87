use std::fmt;

use dashmap::DashMap;
use serde::Serialize;

/// Hard cap on the number of hits a query returns.
pub const SEARCH_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Song,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Song => "song",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shown to the user alongside a hit. Albums and songs carry the
/// artist name resolved at index time.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayFields {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

#[derive(Debug, Clone)]
struct Document {
    kind: EntityKind,
    id: i64,
    keyword: String,
    data: DisplayFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub data: DisplayFields,
}

/// Derived full-text cache over the catalog, keyed by `"{kind}_{id}"`.
///
/// Documents are always regenerable from catalog rows; losing the index
/// degrades search and nothing else. Matching is case-insensitive
/// substring (wildcard on both ends).
pub struct SearchIndex {
    documents: DashMap<String, Document>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    fn key(kind: EntityKind, id: i64) -> String {
        format!("{kind}_{id}")
    }

    /// Idempotent: re-indexing the same `(kind, id)` replaces the document.
    pub fn upsert(&self, kind: EntityKind, id: i64, keyword: &str, data: DisplayFields) {
        self.documents.insert(
            Self::key(kind, id),
            Document {
                kind,
                id,
                keyword: keyword.to_string(),
                data,
            },
        );
    }

    /// Idempotent: removing an absent document is not an error.
    pub fn remove(&self, kind: EntityKind, id: i64) {
        self.documents.remove(&Self::key(kind, id));
    }

    /// Returns up to `SEARCH_LIMIT` hits whose keyword contains the query
    /// anywhere, ordered by document key for a stable result sequence.
    #[must_use]
    pub fn query(&self, substring: &str) -> Vec<SearchHit> {
        let needle = substring.to_lowercase();

        let mut matches: Vec<(String, SearchHit)> = self
            .documents
            .iter()
            .filter(|entry| entry.keyword.to_lowercase().contains(&needle))
            .map(|entry| {
                (
                    entry.key().clone(),
                    SearchHit {
                        id: entry.id,
                        kind: entry.kind,
                        data: entry.data.clone(),
                    },
                )
            })
            .collect();

        matches.sort_by(|a, b| a.0.cmp(&b.0));
        matches.truncate(SEARCH_LIMIT);
        matches.into_iter().map(|(_, hit)| hit).collect()
    }
}
