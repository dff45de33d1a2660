//! Expertise listings: an expert advertising what they can speak to.
//!
//! Listings are published as addressable long-form events (kind 30023) tagged
//! `t=source` and `t=bitcoin`, with a `d` identity key derived from the author so that a
//! newer listing replaces the older one. The earlier kind-9803 profile schema is still
//! readable and is marked [`ListingSchema::LegacyProfile`].

use super::{
    Encoded, KIND_EXPERTISE_LISTING, KIND_HABO_SOURCE_PROFILE, TagCodec, push_facet, singular,
};
use nostr::{D_TAG, Event, T_TAG, has_tag, tag, tag_values};
use serde::Serialize;

/// Title shown for a listing that carries none.
pub const UNTITLED_SOURCE: &str = "Untitled Source";

/// Expertise areas offered as suggestions. Listings are not limited to these.
pub const SUGGESTED_EXPERTISE: [&str; 9] = [
    "development",
    "economics",
    "mining",
    "layer2",
    "custody",
    "regulations",
    "merchants",
    "history",
    "technical-analysis",
];

const IDENTITY_KEY_PREFIX: &str = "habo-source-";
const IDENTITY_KEY_LEN: usize = 16;

/// Topic every expertise listing carries.
pub const TOPIC_SOURCE: &str = "source";
const TOPIC_BITCOIN: &str = "bitcoin";

const TITLE_TAG: &str = "title";
const NAME_TAG: &str = "name";
const SUMMARY_TAG: &str = "summary";
const EXPERTISE_TAG: &str = "expertise";
const TWITTER_TAG: &str = "twitter";
const WEBSITE_TAG: &str = "website";

/// Which schema a listing was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingSchema {
    /// Kind 30023 with a `d` identity key
    #[default]
    Addressable,
    /// Kind 9803 profile, read-only
    LegacyProfile,
}

/// An expertise listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertiseListing {
    pub title: String,
    pub summary: Option<String>,
    /// Bio or long-form write-up
    pub content: String,
    pub expertise: Vec<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub schema: ListingSchema,
}

impl ExpertiseListing {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        expertise: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: None,
            content: content.into(),
            expertise: expertise.into_iter().map(Into::into).collect(),
            twitter: None,
            website: None,
            schema: ListingSchema::Addressable,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_twitter(mut self, handle: impl Into<String>) -> Self {
        self.twitter = Some(handle.into());
        self
    }

    pub fn with_website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }

    /// Summary, falling back to the title.
    pub fn display_summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.title)
    }

    /// Link to the listed Twitter profile.
    pub fn twitter_url(&self) -> Option<String> {
        self.twitter
            .as_deref()
            .map(|handle| format!("https://twitter.com/{}", handle.replace('@', "")))
    }

    fn decode_addressable(event: &Event) -> Self {
        Self {
            title: singular(event, TITLE_TAG).unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
            summary: singular(event, SUMMARY_TAG),
            content: event.content.clone(),
            expertise: expertise_values(event),
            twitter: singular(event, TWITTER_TAG),
            website: singular(event, WEBSITE_TAG),
            schema: ListingSchema::Addressable,
        }
    }

    fn decode_legacy(event: &Event) -> Self {
        Self {
            title: singular(event, NAME_TAG)
                .or_else(|| singular(event, TITLE_TAG))
                .unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
            summary: None,
            content: event.content.clone(),
            expertise: expertise_values(event),
            twitter: singular(event, TWITTER_TAG),
            website: singular(event, WEBSITE_TAG),
            schema: ListingSchema::LegacyProfile,
        }
    }
}

fn expertise_values(event: &Event) -> Vec<String> {
    tag_values(&event.tags, EXPERTISE_TAG)
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Stable `d` identity key for listings by `author`.
pub fn identity_key(author: &str) -> String {
    let short = author.get(..IDENTITY_KEY_LEN).unwrap_or(author);
    format!("{}{}", IDENTITY_KEY_PREFIX, short)
}

/// Display label for an expertise area.
pub fn expertise_label(area: &str) -> &str {
    match area {
        "technical-analysis" => "Analysis",
        "layer2" => "Layer 2",
        other => other,
    }
}

impl TagCodec for ExpertiseListing {
    const KIND: u16 = KIND_EXPERTISE_LISTING;

    fn encode(&self, author: &str) -> Encoded {
        let mut tags = vec![
            tag(D_TAG, identity_key(author)),
            tag(TITLE_TAG, self.title.as_str()),
        ];
        if let Some(summary) = &self.summary {
            tags.push(tag(SUMMARY_TAG, summary.as_str()));
        }
        tags.push(tag(T_TAG, TOPIC_SOURCE));
        tags.push(tag(T_TAG, TOPIC_BITCOIN));
        for area in &self.expertise {
            tags.push(tag(EXPERTISE_TAG, area.as_str()));
        }
        for area in &self.expertise {
            push_facet(&mut tags, area);
        }
        if let Some(twitter) = &self.twitter {
            tags.push(tag(TWITTER_TAG, twitter.as_str()));
        }
        if let Some(website) = &self.website {
            tags.push(tag(WEBSITE_TAG, website.as_str()));
        }

        Encoded {
            kind: Self::KIND,
            tags,
            content: self.content.clone(),
        }
    }

    fn decode(event: &Event) -> Self {
        if event.kind == KIND_HABO_SOURCE_PROFILE {
            Self::decode_legacy(event)
        } else {
            Self::decode_addressable(event)
        }
    }

    /// Kind 30023 is shared with ordinary articles; only those carrying both topic
    /// tags are listings.
    fn accepts(event: &Event) -> bool {
        match event.kind {
            KIND_EXPERTISE_LISTING => {
                has_tag(&event.tags, T_TAG, TOPIC_SOURCE)
                    && has_tag(&event.tags, T_TAG, TOPIC_BITCOIN)
            }
            KIND_HABO_SOURCE_PROFILE => true,
            _ => false,
        }
    }
}
