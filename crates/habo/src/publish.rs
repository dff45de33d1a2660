//! Publish pipeline: form validation, encoding, signing and broadcast.
//!
//! A [`Composer`] owns the draft behind an authoring dialog. Submitting validates the
//! draft locally (a blank required field never reaches the network), encodes it, and
//! hands the `(kind, tags, content)` triple to an [`EventSubmitter`]. On success the
//! dialog closes and the draft resets; on failure both are left as they were.

use crate::codec::{Category, Encoded, ExpertiseListing, Request, TagCodec, non_blank};
use crate::error::PublishError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use nostr::{Event, EventTemplate};
use nostr_client::RelayPool;
use tracing::{debug, warn};

/// A draft that validates into a record.
pub trait Form: Default + Clone + Send {
    type Record: TagCodec;

    /// Check required fields and build the record.
    fn validate(&self) -> Result<Self::Record, PublishError>;
}

fn required(value: &str, field: &'static str) -> Result<(), PublishError> {
    if value.trim().is_empty() {
        Err(PublishError::Validation { field })
    } else {
        Ok(())
    }
}

/// Draft request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub deadline: Option<NaiveDate>,
}

impl Form for RequestForm {
    type Record = Request;

    fn validate(&self) -> Result<Request, PublishError> {
        required(&self.title, "title")?;
        required(&self.content, "content")?;

        Ok(Request {
            title: self.title.trim().to_string(),
            category: self.category,
            content: self.content.clone(),
            deadline: self.deadline,
        })
    }
}

/// Draft expertise listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingForm {
    pub title: String,
    pub summary: String,
    pub bio: String,
    /// Comma-separated expertise areas
    pub expertise: String,
    pub twitter: String,
    pub website: String,
}

impl Form for ListingForm {
    type Record = ExpertiseListing;

    fn validate(&self) -> Result<ExpertiseListing, PublishError> {
        required(&self.title, "title")?;
        required(&self.bio, "bio")?;
        let expertise = parse_expertise(&self.expertise);
        if expertise.is_empty() {
            return Err(PublishError::Validation { field: "expertise" });
        }

        let mut listing = ExpertiseListing::new(self.title.trim(), self.bio.clone(), expertise);
        listing.summary = non_blank(Some(self.summary.as_str()));
        listing.twitter = non_blank(Some(self.twitter.as_str()));
        listing.website = non_blank(Some(self.website.as_str()));
        Ok(listing)
    }
}

/// Split a comma-separated expertise input into distinct, trimmed areas.
pub fn parse_expertise(input: &str) -> Vec<String> {
    let mut areas: Vec<String> = Vec::new();
    for area in input.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        if !areas.iter().any(|existing| existing == area) {
            areas.push(area.to_string());
        }
    }
    areas
}

/// Broadcast acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub event_id: String,
    /// Relays that accepted the event
    pub accepted_by: Vec<String>,
}

/// External capability that signs and broadcasts encoded records.
#[async_trait]
pub trait EventSubmitter: Send + Sync {
    /// Hex public key events will be signed with.
    fn author(&self) -> &str;

    async fn submit(&self, encoded: Encoded) -> Result<PublishOutcome, PublishError>;
}

/// Signs event templates. Key custody lives outside this crate.
#[async_trait]
pub trait Signer: Send + Sync {
    fn public_key(&self) -> &str;

    async fn sign(&self, template: EventTemplate) -> Result<Event, PublishError>;
}

/// Submitter that signs with a [`Signer`] and broadcasts to a relay pool.
pub struct RelaySubmitter<S> {
    signer: S,
    pool: RelayPool,
}

impl<S: Signer> RelaySubmitter<S> {
    pub fn new(signer: S, pool: RelayPool) -> Self {
        Self { signer, pool }
    }
}

#[async_trait]
impl<S: Signer> EventSubmitter for RelaySubmitter<S> {
    fn author(&self) -> &str {
        self.signer.public_key()
    }

    async fn submit(&self, encoded: Encoded) -> Result<PublishOutcome, PublishError> {
        let created_at = Utc::now().timestamp().max(0) as u64;
        let event = self.signer.sign(encoded.into_template(created_at)).await?;

        let mut accepted_by = Vec::new();
        let mut rejection = None;
        let mut failures = Vec::new();

        for (relay, result) in self.pool.publish(&event).await {
            match result {
                Ok(confirmation) if confirmation.accepted => accepted_by.push(relay),
                Ok(confirmation) => {
                    if rejection.is_none() {
                        rejection = Some(PublishError::Rejected {
                            relay,
                            message: confirmation.message,
                        });
                    }
                }
                Err(e) => failures.push(format!("{}: {}", relay, e)),
            }
        }

        if accepted_by.is_empty() {
            let error = rejection.unwrap_or_else(|| {
                PublishError::NoRelayAccepted(if failures.is_empty() {
                    "no relays configured".to_string()
                } else {
                    failures.join("; ")
                })
            });
            warn!("Publishing {} failed: {}", event.id, error);
            return Err(error);
        }

        Ok(PublishOutcome {
            event_id: event.id,
            accepted_by,
        })
    }
}

/// Authoring dialog state around a draft.
#[derive(Debug, Clone, Default)]
pub struct Composer<F> {
    draft: F,
    open: bool,
    last_error: Option<PublishError>,
}

impl<F: Form> Composer<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the dialog, keeping any unsent draft.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close the dialog. The draft is kept.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn draft(&self) -> &F {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut F {
        &mut self.draft
    }

    /// Error from the most recent failed submit.
    pub fn last_error(&self) -> Option<&PublishError> {
        self.last_error.as_ref()
    }

    /// Whether the draft would pass validation.
    pub fn can_submit(&self) -> bool {
        self.draft.validate().is_ok()
    }

    /// Validate, encode and submit the draft.
    pub async fn submit(
        &mut self,
        submitter: &dyn EventSubmitter,
    ) -> Result<PublishOutcome, PublishError> {
        let encoded = self
            .draft
            .validate()
            .map(|record| record.encode(submitter.author()));
        let result = match encoded {
            Ok(encoded) => {
                debug!(
                    "Submitting kind {} with {} tags",
                    encoded.kind,
                    encoded.tags.len()
                );
                submitter.submit(encoded).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => {
                self.draft = F::default();
                self.open = false;
                self.last_error = None;
            }
            Err(e) => self.last_error = Some(e.clone()),
        }
        result
    }
}
