//! Filter builder: UI selections to relay filters.

use crate::codec::{
    KIND_EXPERTISE_LISTING, KIND_HABO_REQUEST, KIND_HABO_SOURCE_PROFILE, TOPIC_SOURCE,
    normalize_facet,
};
use nostr::T_TAG;
use nostr_client::Filter;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default page size for requests.
pub const DEFAULT_REQUEST_LIMIT: u64 = 50;

/// Default page size for expertise listings.
pub const DEFAULT_LISTING_LIMIT: u64 = 100;

/// Selection value meaning "no facet constraint".
pub const ALL_FACETS: &str = "all";

/// Which marketplace record type a query is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Request,
    ExpertiseListing,
}

impl RecordKind {
    /// Kind the record type is published under.
    pub fn kind(&self) -> u16 {
        match self {
            RecordKind::Request => KIND_HABO_REQUEST,
            RecordKind::ExpertiseListing => KIND_EXPERTISE_LISTING,
        }
    }

    /// Name of the facet dimension.
    pub fn facet_name(&self) -> &'static str {
        match self {
            RecordKind::Request => "category",
            RecordKind::ExpertiseListing => "expertise",
        }
    }

    pub fn default_limit(&self) -> u64 {
        match self {
            RecordKind::Request => DEFAULT_REQUEST_LIMIT,
            RecordKind::ExpertiseListing => DEFAULT_LISTING_LIMIT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Request => "request",
            RecordKind::ExpertiseListing => "expertise-listing",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A facet selection: everything, or exactly one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FacetSelection {
    #[default]
    All,
    Value(String),
}

impl FacetSelection {
    /// Parse a UI selection. `"all"` and blank select everything; anything else is
    /// normalized to its relay form.
    pub fn parse(selection: &str) -> Self {
        let normalized = normalize_facet(selection);
        if normalized.is_empty() || normalized == ALL_FACETS {
            FacetSelection::All
        } else {
            FacetSelection::Value(normalized)
        }
    }

    /// The selected value, if constrained.
    pub fn value(&self) -> Option<&str> {
        match self {
            FacetSelection::All => None,
            FacetSelection::Value(v) => Some(v),
        }
    }
}

impl FromStr for FacetSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FacetSelection {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for FacetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL_FACETS))
    }
}

/// Build the relay filter for a selection.
///
/// A facet value constrains the `t` tag to exactly that value. Unfaceted listing
/// queries are still scoped to the `source` topic, because their kind is shared with
/// ordinary long-form articles. Articles that carry a selected facet value reach the
/// client and are dropped when decoding.
pub fn build_filter(kind: RecordKind, facet: &FacetSelection, limit: u64) -> Filter {
    let filter = Filter::new().kinds([kind.kind()]).limit(limit);

    match (kind, facet.value()) {
        (_, Some(value)) => filter.tag(T_TAG, [value]),
        (RecordKind::ExpertiseListing, None) => filter.tag(T_TAG, [TOPIC_SOURCE]),
        (RecordKind::Request, None) => filter,
    }
}

/// Every filter a selection is queried with.
///
/// Legacy profiles carry no `t` tags, so when enabled they get a filter of their own,
/// and only on the unfaceted listing selection.
pub fn query_filters(
    kind: RecordKind,
    facet: &FacetSelection,
    limit: u64,
    include_legacy: bool,
) -> Vec<Filter> {
    let mut filters = vec![build_filter(kind, facet, limit)];
    if include_legacy && kind == RecordKind::ExpertiseListing && facet.value().is_none() {
        filters.push(
            Filter::new()
                .kinds([KIND_HABO_SOURCE_PROFILE])
                .limit(limit),
        );
    }
    filters
}
