//! Read helpers for the flat tag list.
//!
//! Tags are a name-repeatable multimap: singular lookups take the first tag with a
//! given name, multi-valued lookups take every match in encoded order. Tags without a
//! value element are skipped.

/// Hashtag tag name (NIP-24). Relays index single-letter tag names only.
pub const T_TAG: &str = "t";

/// Build a `[name, value]` tag.
pub fn tag(name: &str, value: impl Into<String>) -> Vec<String> {
    vec![name.to_string(), value.into()]
}

/// Value of the first tag named `name`, if any.
pub fn first_tag_value<'a>(tags: &'a [Vec<String>], name: &str) -> Option<&'a str> {
    tags.iter()
        .filter(|tag| tag.first().map(String::as_str) == Some(name))
        .find_map(|tag| tag.get(1))
        .map(String::as_str)
}

/// Values of every tag named `name`, in tag order.
pub fn tag_values<'a>(tags: &'a [Vec<String>], name: &str) -> Vec<&'a str> {
    tags.iter()
        .filter(|tag| tag.first().map(String::as_str) == Some(name))
        .filter_map(|tag| tag.get(1))
        .map(String::as_str)
        .collect()
}

/// Whether any tag is exactly `[name, value, ..]`.
pub fn has_tag(tags: &[Vec<String>], name: &str, value: &str) -> bool {
    tag_values(tags, name).contains(&value)
}
