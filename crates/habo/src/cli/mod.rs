//! `habo` command line: browse requests and expertise listings on the relays.

mod render;

use crate::codec::{Category, SUGGESTED_EXPERTISE, expertise_label};
use crate::config::HaboConfig;
use crate::facet::FacetSelection;
use crate::feed::{MarketRecord, Marketplace, Page};
use crate::{ExpertiseListing, Request};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Parser)]
#[command(name = "habo")]
#[command(about = "Browse HABO requests and expert sources on Nostr relays", long_about = None)]
pub struct Cli {
    /// Config file (JSON). Falls back to $HABO_CONFIG, then defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Relay URL; repeat to query several. Replaces the configured list
    #[arg(long = "relay", global = true)]
    pub relays: Vec<String>,

    /// Query timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List open requests
    Requests {
        /// Category to filter by ("all" for every category)
        #[arg(long, default_value = "all")]
        category: String,

        /// Case-insensitive search over title and description
        #[arg(long)]
        search: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List expert sources
    Sources {
        /// Expertise area to filter by ("all" for every area)
        #[arg(long, default_value = "all")]
        expertise: String,

        /// Case-insensitive search over title and bio
        #[arg(long)]
        search: Option<String>,

        /// Also read kind-9803 source profiles
        #[arg(long)]
        legacy: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show request categories and suggested expertise areas
    Facets,
}

impl Cli {
    /// Effective configuration after file, environment and flag overrides.
    pub fn load_config(&self) -> anyhow::Result<HaboConfig> {
        let mut config = match &self.config {
            Some(path) => HaboConfig::load(path)?,
            None => HaboConfig::from_env_or_default()?,
        };

        if !self.relays.is_empty() {
            config = config.with_relays(self.relays.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.query_timeout_ms = timeout_ms;
        }
        if let Commands::Sources { legacy: true, .. } = self.command {
            config.include_legacy_profiles = true;
        }
        Ok(config)
    }

    pub async fn execute(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        debug!("Using relays: {}", config.relays.join(", "));

        match self.command {
            Commands::Requests {
                category,
                search,
                json,
            } => {
                let page = fetch::<Request>(config, &category).await?;
                show(&page, search.as_deref(), json, render::request_line)?;
            }
            Commands::Sources {
                expertise,
                search,
                json,
                ..
            } => {
                let page = fetch::<ExpertiseListing>(config, &expertise).await?;
                show(&page, search.as_deref(), json, render::listing_line)?;
            }
            Commands::Facets => {
                println!("Categories:");
                for category in Category::ALL {
                    println!("  {:<12} {}", category.as_str(), category.label());
                }
                println!();
                println!("Suggested expertise:");
                for area in SUGGESTED_EXPERTISE {
                    println!("  {:<20} {}", area, expertise_label(area));
                }
            }
        }

        Ok(())
    }
}

async fn fetch<T: MarketRecord>(config: HaboConfig, selection: &str) -> anyhow::Result<Page<T>> {
    let market = Marketplace::from_config(config)?;
    let facet = FacetSelection::parse(selection);

    market
        .query::<T>(&facet, CancellationToken::new())
        .await
        .ok_or_else(|| anyhow::anyhow!("query for {} was cancelled", facet))
}

fn show<T: MarketRecord + Serialize>(
    page: &Page<T>,
    search: Option<&str>,
    json: bool,
    line: fn(&crate::Decoded<T>) -> String,
) -> anyhow::Result<()> {
    let search = search.unwrap_or("");
    let records = page.refine(search);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    match page.empty_state(search) {
        Some(empty) => println!("{}", empty.message(T::RECORD_KIND)),
        None => {
            for record in &records {
                println!("{}", line(record));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_flags_override_config() {
        let cli = Cli::parse_from([
            "habo",
            "--relay",
            "ws://127.0.0.1:7777",
            "--relay",
            "ws://127.0.0.1:7778",
            "--timeout-ms",
            "500",
            "sources",
            "--expertise",
            "mining",
            "--legacy",
        ]);

        let config = cli.load_config().unwrap();
        assert_eq!(
            config.relays,
            vec!["ws://127.0.0.1:7777", "ws://127.0.0.1:7778"]
        );
        assert_eq!(config.query_timeout_ms, 500);
        assert!(config.include_legacy_profiles);
    }

    #[test]
    fn test_requests_defaults_to_all() {
        let cli = Cli::parse_from(["habo", "requests"]);
        match cli.command {
            Commands::Requests {
                category, json, ..
            } => {
                assert_eq!(category, "all");
                assert!(!json);
            }
            _ => panic!("expected requests command"),
        }
    }
}
