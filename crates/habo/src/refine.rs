//! Local refinement: substring search over already-fetched records.
//!
//! Relays only filter on exact tag values, so free-text search runs client side.

use crate::codec::{Decoded, ExpertiseListing, Request};
use crate::facet::RecordKind;

/// A record that can be matched against a search term.
pub trait Searchable {
    /// Primary label (title or name).
    fn primary_label(&self) -> &str;

    /// Free-text body.
    fn body(&self) -> &str;
}

impl Searchable for Request {
    fn primary_label(&self) -> &str {
        &self.title
    }

    fn body(&self) -> &str {
        &self.content
    }
}

impl Searchable for ExpertiseListing {
    fn primary_label(&self) -> &str {
        &self.title
    }

    fn body(&self) -> &str {
        &self.content
    }
}

impl<T: Searchable> Searchable for Decoded<T> {
    fn primary_label(&self) -> &str {
        self.record.primary_label()
    }

    fn body(&self) -> &str {
        self.record.body()
    }
}

/// Whether `record` matches `search_term`, case-insensitively, on label or body.
pub fn matches_search<T: Searchable + ?Sized>(record: &T, search_term: &str) -> bool {
    let needle = search_term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record.primary_label().to_lowercase().contains(&needle)
        || record.body().to_lowercase().contains(&needle)
}

/// Records matching `search_term`, in their original order.
pub fn refine<T: Searchable + Clone>(records: &[T], search_term: &str) -> Vec<T> {
    records
        .iter()
        .filter(|record| matches_search(*record, search_term))
        .cloned()
        .collect()
}

/// Why a refined list is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyState {
    /// Nothing was fetched
    NoRecords,
    /// Records exist but none match the search
    NoMatches { search_term: String },
}

impl EmptyState {
    pub fn for_search(search_term: &str) -> Self {
        if search_term.trim().is_empty() {
            EmptyState::NoRecords
        } else {
            EmptyState::NoMatches {
                search_term: search_term.to_string(),
            }
        }
    }

    /// User-facing message for a list of `kind` records.
    pub fn message(&self, kind: RecordKind) -> &'static str {
        match (self, kind) {
            (EmptyState::NoRecords, RecordKind::Request) => "No queries found. Check back soon!",
            (EmptyState::NoRecords, RecordKind::ExpertiseListing) => "No sources found yet.",
            (EmptyState::NoMatches { .. }, RecordKind::Request) => {
                "No queries match your search."
            }
            (EmptyState::NoMatches { .. }, RecordKind::ExpertiseListing) => {
                "No sources match your search."
            }
        }
    }
}
