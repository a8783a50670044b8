use anyhow::Result;
use httpmock::prelude::*;
use nuda_market::{
    CallPolicy, HttpListingStore, IdentityResolver, MatchKind, PropertyType, Resolution, RetryPolicy,
};
use regex::Regex;
use serde_json::json;
use std::time::Duration;

fn store_for(server: &MockServer) -> HttpListingStore {
    HttpListingStore::new(&server.base_url(), "/api/v1", Duration::from_secs(2)).unwrap()
}

fn fast_policy(max_retries: u32) -> CallPolicy {
    CallPolicy {
        call_timeout: Some(Duration::from_secs(2)),
        by_id_retry: RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        },
    }
}

fn listing_json(id: u64, city: &str, property_type: &str, rooms: u32, sqm: f64) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Listing {}", id),
        "property_type": property_type,
        "city": city,
        "province": "MI",
        "surface_sqm": sqm,
        "rooms": rooms,
        "bathrooms": 1,
        "full_property_value": 250000.0,
        "bare_property_value": 140000.0,
        "usufructuary_age": 78
    })
}

#[tokio::test]
async fn test_direct_hit_makes_no_search_call() -> Result<()> {
    let server = MockServer::start();

    let by_id = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/42");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(listing_json(42, "Milano", "appartamento", 3, 85.4));
    });
    let search = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/search");
        then.status(200).json_body(json!([]));
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(0));
    let resolution = resolver
        .resolve_detailed("milano", "appartamento-3-locali-85mq-42")
        .await;

    let Resolution::Found(resolved) = resolution else {
        panic!("expected a match, got {:?}", resolution);
    };
    assert_eq!(resolved.listing.id, 42);
    assert_eq!(resolved.listing.property_type, PropertyType::Appartamento);
    assert_eq!(resolved.matched_by, MatchKind::Direct);

    by_id.assert_hits(1);
    assert_eq!(search.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_city_mismatch_falls_back_to_search() -> Result<()> {
    let server = MockServer::start();

    let by_id = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/42");
        then.status(200).json_body(listing_json(42, "Roma", "appartamento", 3, 85.4));
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/properties/search")
            .query_param("city", "Milano");
        then.status(200).json_body(json!({
            "items": [
                listing_json(7, "Milano", "villa", 6, 300.0),
                listing_json(9, "Milano", "appartamento", 3, 85.0)
            ],
            "total": 2
        }));
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(0));
    let listing = resolver
        .resolve("milano", "appartamento-3-locali-85mq-42")
        .await
        .expect("fallback should pick a Milano listing");

    assert_eq!(listing.id, 9);
    assert_eq!(listing.city, "Milano");
    by_id.assert_hits(1);
    search.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_legacy_slug_goes_straight_to_search() -> Result<()> {
    let server = MockServer::start();

    let by_id = server.mock(|when, then| {
        when.method(GET)
            .path_matches(Regex::new(r"^/api/v1/properties/\d+$").unwrap());
        then.status(200).json_body(listing_json(1, "Torino", "loft", 2, 70.0));
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/properties/search")
            .query_param("city", "Torino");
        then.status(200).json_body(json!([listing_json(5, "Torino", "loft", 2, 70.0)]));
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(0));
    let resolution = resolver.resolve_detailed("torino", "loft-2-locali-70mq").await;

    let Resolution::Found(resolved) = resolution else {
        panic!("expected a match, got {:?}", resolution);
    };
    assert_eq!(resolved.listing.id, 5);
    assert_eq!(resolved.matched_by, MatchKind::Scored(3));
    assert_eq!(by_id.hits(), 0);
    search.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_listing_is_not_found() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/404");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/search");
        then.status(200).json_body(json!({ "properties": [] }));
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(2));
    let resolution = resolver.resolve_detailed("napoli", "villa-404").await;

    assert_eq!(resolution, Resolution::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_server_errors_are_retried_then_reported_unavailable() -> Result<()> {
    let server = MockServer::start();

    let by_id = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/42");
        then.status(503);
    });
    let search = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/search");
        then.status(500);
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(2));
    let resolution = resolver
        .resolve_detailed("milano", "appartamento-3-locali-85mq-42")
        .await;

    assert_eq!(resolution, Resolution::Unavailable);
    by_id.assert_hits(3);
    search.assert_hits(1);
    assert!(resolver.resolve("milano", "appartamento-3-locali-85mq-42").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_request_is_not_retried() -> Result<()> {
    let server = MockServer::start();

    let by_id = server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/42");
        then.status(400);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/properties/search");
        then.status(200).json_body(json!([listing_json(3, "Milano", "attico", 4, 120.0)]));
    });

    let resolver = IdentityResolver::new(store_for(&server)).with_policy(fast_policy(2));
    let resolution = resolver
        .resolve_detailed("milano", "appartamento-3-locali-85mq-42")
        .await;

    let Resolution::Found(resolved) = resolution else {
        panic!("expected the first candidate, got {:?}", resolution);
    };
    assert_eq!(resolved.matched_by, MatchKind::FirstCandidate);
    assert_eq!(resolved.listing.id, 3);
    by_id.assert_hits(1);
    Ok(())
}
