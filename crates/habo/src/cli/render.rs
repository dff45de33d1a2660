//! One-line text rendering for the CLI.

use crate::codec::{Decoded, ExpertiseListing, ListingSchema, Request, expertise_label};
use chrono::DateTime;

fn posted(created_at: u64) -> String {
    DateTime::from_timestamp(created_at as i64, 0)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string())
}

fn short(author: &str) -> &str {
    author.get(..8).unwrap_or(author)
}

pub(super) fn request_line(decoded: &Decoded<Request>) -> String {
    let request = &decoded.record;
    let mut line = format!(
        "{}  [{}]  {}  ({})",
        posted(decoded.created_at),
        request.category.label(),
        request.title,
        short(&decoded.author)
    );
    if let Some(deadline) = request.deadline {
        line.push_str(&format!("  due {}", deadline.format("%Y-%m-%d")));
    }
    line
}

pub(super) fn listing_line(decoded: &Decoded<ExpertiseListing>) -> String {
    let listing = &decoded.record;
    let areas: Vec<&str> = listing
        .expertise
        .iter()
        .map(|area| expertise_label(area))
        .collect();

    let mut line = format!(
        "{}  {}  ({})  {}",
        posted(decoded.created_at),
        listing.title,
        short(&decoded.author),
        areas.join(", ")
    );
    if let Some(url) = listing.twitter_url() {
        line.push_str(&format!("  {}", url));
    }
    if let Some(website) = &listing.website {
        line.push_str(&format!("  {}", website));
    }
    if listing.schema == ListingSchema::LegacyProfile {
        line.push_str("  [profile]");
    }
    line
}
