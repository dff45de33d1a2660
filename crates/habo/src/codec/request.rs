//! Marketplace requests: a requester looking for an expert source.

use super::{Encoded, KIND_HABO_REQUEST, TagCodec, push_facet, singular};
use chrono::NaiveDate;
use nostr::{Event, tag};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Title shown for a request that carries none.
pub const UNTITLED_QUERY: &str = "Untitled Query";

const TITLE_TAG: &str = "title";
const CATEGORY_TAG: &str = "category";
const DEADLINE_TAG: &str = "deadline";
const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Request category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    News,
    Interview,
    Podcast,
    Documentary,
    Research,
    Analysis,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 7] = [
        Category::General,
        Category::News,
        Category::Interview,
        Category::Podcast,
        Category::Documentary,
        Category::Research,
        Category::Analysis,
    ];

    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::News => "news",
            Category::Interview => "interview",
            Category::Podcast => "podcast",
            Category::Documentary => "documentary",
            Category::Research => "research",
            Category::Analysis => "analysis",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::News => "News",
            Category::Interview => "Interview",
            Category::Podcast => "Podcast",
            Category::Documentary => "Documentary",
            Category::Research => "Research",
            Category::Analysis => "Analysis",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// A request for expert input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub title: String,
    pub category: Category,
    pub content: String,
    pub deadline: Option<NaiveDate>,
}

impl Request {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: Category::default(),
            content: content.into(),
            deadline: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl TagCodec for Request {
    const KIND: u16 = KIND_HABO_REQUEST;

    fn encode(&self, _author: &str) -> Encoded {
        let mut tags = vec![
            tag(TITLE_TAG, self.title.as_str()),
            tag(CATEGORY_TAG, self.category.as_str()),
        ];
        push_facet(&mut tags, self.category.as_str());
        if let Some(deadline) = self.deadline {
            tags.push(tag(DEADLINE_TAG, deadline.format(DEADLINE_FORMAT).to_string()));
        }

        Encoded {
            kind: Self::KIND,
            tags,
            content: self.content.clone(),
        }
    }

    fn decode(event: &Event) -> Self {
        Self {
            title: singular(event, TITLE_TAG).unwrap_or_else(|| UNTITLED_QUERY.to_string()),
            category: singular(event, CATEGORY_TAG)
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            content: event.content.clone(),
            deadline: singular(event, DEADLINE_TAG)
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), DEADLINE_FORMAT).ok()),
        }
    }
}
