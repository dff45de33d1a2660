//! Integration tests for the read path against in-memory relays

mod common;

use common::{ALICE, BOB, pool_of, raw_event, relay, signed, test_config};
use habo::{
    Category, EmptyState, ExpertiseListing, FacetSelection, HaboConfig, Marketplace, RecordKind,
    Request,
};
use nostr::tag;
use nostr_client::{MemoryRelayBehavior, QueryStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn ids<T>(page: &habo::Page<T>) -> Vec<&str> {
    page.records.iter().map(|d| d.id.as_str()).collect()
}

// =========================================================================
// Ordering and dedup
// =========================================================================

#[tokio::test]
async fn test_duplicates_across_relays_collapse() {
    let request = signed(&Request::new("Title", "Body"), ALICE, 100);
    let a = relay("a", vec![request.clone()]);
    let b = relay("b", vec![request.clone()]);
    let market = Marketplace::new(pool_of(&[&a, &b]), test_config());

    let page = market
        .query::<Request>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![request.id.as_str()]);
    assert_eq!(page.status, QueryStatus::Complete);
}

#[tokio::test]
async fn test_newest_first_with_id_tiebreak() {
    let request_tags = vec![tag("title", "x"), tag("category", "general")];
    let a = relay(
        "a",
        vec![
            raw_event("b", 9802, 100, request_tags.clone()),
            raw_event("a", 9802, 300, request_tags.clone()),
        ],
    );
    let b = relay("b", vec![raw_event("c", 9802, 100, request_tags)]);
    let market = Marketplace::new(pool_of(&[&a, &b]), test_config());

    let page = market
        .query::<Request>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    let order: Vec<(u64, &str)> = page
        .records
        .iter()
        .map(|d| (d.created_at, d.id.as_str()))
        .collect();
    assert_eq!(order, vec![(300, "a"), (100, "b"), (100, "c")]);
}

// =========================================================================
// Facets
// =========================================================================

#[tokio::test]
async fn test_expertise_facet_matches_exactly() {
    let miner = signed(
        &ExpertiseListing::new("Miner", "Pool operator", ["Mining"]),
        ALICE,
        100,
    );
    let custodian = signed(
        &ExpertiseListing::new("Custodian", "Vault design", ["custody", "mining-hardware"]),
        BOB,
        200,
    );
    let relay = relay("a", vec![miner.clone(), custodian.clone()]);
    let market = Marketplace::new(pool_of(&[&relay]), test_config());

    let mining = market
        .query::<ExpertiseListing>(&FacetSelection::parse("mining"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(&mining), vec![miner.id.as_str()]);

    let all = market
        .query::<ExpertiseListing>(&FacetSelection::parse("all"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(&all), vec![custodian.id.as_str(), miner.id.as_str()]);
}

#[tokio::test]
async fn test_request_category_facet() {
    let podcast = signed(
        &Request::new("Podcast guest", "Episode 12").with_category(Category::Podcast),
        ALICE,
        100,
    );
    let news = signed(
        &Request::new("News quote", "Halving coverage").with_category(Category::News),
        BOB,
        200,
    );
    let relay = relay("a", vec![podcast.clone(), news]);
    let market = Marketplace::new(pool_of(&[&relay]), test_config());

    let page = market
        .query::<Request>(&FacetSelection::parse("Podcast"), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![podcast.id.as_str()]);
    assert_eq!(page.records[0].record.category, Category::Podcast);
}

#[tokio::test]
async fn test_foreign_long_form_is_dropped() {
    let listing = signed(
        &ExpertiseListing::new("Miner", "Pool operator", ["mining"]),
        ALICE,
        100,
    );
    let article = raw_event(
        "article",
        30023,
        300,
        vec![tag("d", "essay"), tag("title", "On money"), tag("t", "bitcoin")],
    );
    let relay = relay("a", vec![listing.clone(), article]);
    let market = Marketplace::new(pool_of(&[&relay]), test_config());

    let page = market
        .query::<ExpertiseListing>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![listing.id.as_str()]);
}

#[tokio::test]
async fn test_listings_survive_a_flood_of_articles() {
    let listing = signed(
        &ExpertiseListing::new("Miner", "Pool operator", ["mining"]),
        ALICE,
        100,
    );
    let mut events = vec![listing.clone()];
    for i in 0..150u64 {
        events.push(raw_event(
            &format!("article-{}", i),
            30023,
            1000 + i,
            vec![tag("d", format!("essay-{}", i)), tag("t", "bitcoin")],
        ));
    }
    let relay = relay("a", events);
    let market = Marketplace::new(pool_of(&[&relay]), test_config());

    let page = market
        .query::<ExpertiseListing>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ids(&page), vec![listing.id.as_str()]);
}

#[tokio::test]
async fn test_legacy_profiles_only_when_enabled() {
    let legacy = raw_event(
        "legacy",
        9803,
        100,
        vec![tag("expertise", "mining"), tag("twitter", "@miner")],
    );
    let relay = relay("a", vec![legacy]);

    let default_market = Marketplace::new(pool_of(&[&relay]), test_config());
    let page = default_market
        .query::<ExpertiseListing>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();
    assert!(page.records.is_empty());

    let legacy_market = Marketplace::new(
        pool_of(&[&relay]),
        HaboConfig {
            include_legacy_profiles: true,
            ..test_config()
        },
    );
    let page = legacy_market
        .query::<ExpertiseListing>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(&page), vec!["legacy"]);
    assert_eq!(page.records[0].record.expertise, vec!["mining"]);
}

// =========================================================================
// Timeouts and failures
// =========================================================================

#[tokio::test]
async fn test_silent_relay_resolves_empty() {
    let silent = relay("silent", vec![signed(&Request::new("T", "B"), ALICE, 1)]);
    silent
        .set_behavior(MemoryRelayBehavior {
            silent: true,
            ..Default::default()
        })
        .await;
    let market = Marketplace::new(
        pool_of(&[&silent]),
        HaboConfig {
            query_timeout_ms: 100,
            ..test_config()
        },
    );

    let page = market
        .query::<Request>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    assert!(page.records.is_empty());
    assert_eq!(page.status, QueryStatus::TimedOut);
    assert_eq!(page.empty_state(""), Some(EmptyState::NoRecords));
}

#[tokio::test]
async fn test_partial_page_served_from_cache_stays_partial() {
    let fast = relay("fast", vec![signed(&Request::new("T", "B"), ALICE, 1)]);
    let silent = relay("silent", vec![]);
    silent
        .set_behavior(MemoryRelayBehavior {
            silent: true,
            ..Default::default()
        })
        .await;
    let market = Marketplace::new(
        pool_of(&[&fast, &silent]),
        HaboConfig {
            query_timeout_ms: 100,
            ..test_config()
        },
    );

    let first = market
        .query::<Request>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.status, QueryStatus::TimedOut);
    assert_eq!(first.records.len(), 1);

    let cached = market
        .query::<Request>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();
    assert!(cached.from_cache);
    assert_eq!(cached.status, QueryStatus::TimedOut);
    assert_eq!(fast.fetch_count(), 1);
}

#[tokio::test]
async fn test_empty_timeout_is_not_cached() {
    let silent = relay("silent", vec![]);
    silent
        .set_behavior(MemoryRelayBehavior {
            silent: true,
            ..Default::default()
        })
        .await;
    let market = Marketplace::new(
        pool_of(&[&silent]),
        HaboConfig {
            query_timeout_ms: 50,
            ..test_config()
        },
    );

    for _ in 0..2 {
        market
            .query::<Request>(&FacetSelection::All, CancellationToken::new())
            .await
            .unwrap();
    }
    assert_eq!(silent.fetch_count(), 2);
}

#[tokio::test]
async fn test_cancelled_query_yields_none() {
    let slow = relay("slow", vec![signed(&Request::new("T", "B"), ALICE, 1)]);
    slow.set_delay(Some(std::time::Duration::from_millis(500)))
        .await;
    let market = Arc::new(Marketplace::new(pool_of(&[&slow]), test_config()));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let page = market
        .query::<Request>(&FacetSelection::All, cancel)
        .await;

    assert!(page.is_none());
    assert_eq!(market.invalidate(RecordKind::Request).await, 0);
}

// =========================================================================
// Local refinement
// =========================================================================

#[tokio::test]
async fn test_search_refines_fetched_page() {
    let lightning = signed(
        &ExpertiseListing::new("Lightning Dev", "Channels and routing", ["layer2"]),
        ALICE,
        200,
    );
    let mining = signed(
        &ExpertiseListing::new("Mining Analyst", "Hashrate markets", ["mining"]),
        BOB,
        100,
    );
    let relay = relay("a", vec![lightning, mining]);
    let market = Marketplace::new(pool_of(&[&relay]), test_config());

    let page = market
        .query::<ExpertiseListing>(&FacetSelection::All, CancellationToken::new())
        .await
        .unwrap();

    let titles = |records: Vec<habo::Decoded<ExpertiseListing>>| -> Vec<String> {
        records.into_iter().map(|d| d.record.title).collect()
    };
    assert_eq!(titles(page.refine("lightning")), vec!["Lightning Dev"]);
    assert_eq!(
        titles(page.refine("")),
        vec!["Lightning Dev", "Mining Analyst"]
    );
    assert_eq!(
        page.empty_state("custody"),
        Some(EmptyState::NoMatches {
            search_term: "custody".to_string()
        })
    );
    assert_eq!(page.empty_state("hashrate"), None);
    assert_eq!(relay.fetch_count(), 1);
}
