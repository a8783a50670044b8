//! Maps a `/nuda-proprieta/{city}/{slug}` pair back to a listing.
//!
//! Resolution runs an ordered list of strategies and stops at the first one
//! that produces a listing. The default pipeline is a direct lookup by the
//! slug's trailing id, followed by a city search scored against the slug for
//! legacy links.

use crate::core::slug::{city_from_slug, extract_id, rooms_token, slugify, surface_token, type_token};
use crate::domain::model::Listing;
use crate::domain::ports::ListingStore;
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Minimum number of matching slug tokens for a scored fallback match.
pub const MIN_FALLBACK_SCORE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Fetched by id and the city matched.
    Direct,
    /// City-search candidate matching this many slug tokens.
    Scored(u8),
    /// No candidate scored high enough; the first search result was used.
    FirstCandidate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub listing: Listing,
    pub matched_by: MatchKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Resolved),
    /// Every store call answered and none produced a listing.
    NotFound,
    /// Nothing was found and at least one store call failed, so the listing
    /// may still exist.
    Unavailable,
}

impl Resolution {
    pub fn into_listing(self) -> Option<Listing> {
        match self {
            Resolution::Found(resolved) => Some(resolved.listing),
            Resolution::NotFound | Resolution::Unavailable => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Matched(Resolved),
    Miss { store_failed: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub city_slug: &'a str,
    pub listing_slug: &'a str,
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Limits applied to every store call made during a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub call_timeout: Option<Duration>,
    /// Applied to the by-id fetch only; the city search is already the
    /// fallback path.
    pub by_id_retry: RetryPolicy,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            call_timeout: Some(Duration::from_secs(10)),
            by_id_retry: RetryPolicy::default(),
        }
    }
}

/// Store access with the call policy applied.
pub struct StoreGateway<'a> {
    store: &'a dyn ListingStore,
    policy: &'a CallPolicy,
}

impl<'a> StoreGateway<'a> {
    pub fn new(store: &'a dyn ListingStore, policy: &'a CallPolicy) -> Self {
        Self { store, policy }
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match self.policy.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| MarketError::StoreTimeout {
                    operation: operation.to_string(),
                    after: limit,
                })?,
            None => call.await,
        }
    }

    pub async fn listing(&self, id: u64) -> Result<Option<Listing>> {
        let retry = self.policy.by_id_retry;
        let mut attempt = 0;
        loop {
            match self.bounded("listing", self.store.listing(id)).await {
                Err(err) if err.is_transient() && attempt < retry.max_retries => {
                    let delay = retry.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Fetching listing {} failed ({}), retry {}/{} in {:?}",
                        id,
                        err,
                        attempt,
                        retry.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    pub async fn listings_by_city(&self, city: &str) -> Result<Vec<Listing>> {
        self.bounded("listings_by_city", self.store.listings_by_city(city))
            .await
    }
}

#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, gateway: &StoreGateway<'_>, request: ResolveRequest<'_>) -> StrategyOutcome;
}

/// True when the listing's city equals the one named by the slug, ignoring
/// case.
///
/// Both sides are compared in slug form, so accents and apostrophes that the
/// slug dropped ("Forlì" as `forli`, "L'Aquila" as `laquila`) still match.
/// The city-search fallback sends the display name rebuilt from the slug
/// (`Forli`, `Laquila`) and relies on the store to match it loosely.
pub fn city_matches(listing: &Listing, city_slug: &str) -> bool {
    let wanted = slugify(city_slug);
    !wanted.is_empty() && slugify(&listing.city) == wanted
}

/// Fetch by the id at the end of the slug; accept only if the city matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectLookup;

#[async_trait]
impl ResolutionStrategy for DirectLookup {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn attempt(&self, gateway: &StoreGateway<'_>, request: ResolveRequest<'_>) -> StrategyOutcome {
        let Some(id) = extract_id(request.listing_slug) else {
            tracing::debug!("Slug '{}' carries no id", request.listing_slug);
            return StrategyOutcome::Miss { store_failed: false };
        };

        tracing::debug!("Fetching listing by id {}", id);
        match gateway.listing(id).await {
            Ok(Some(listing)) if city_matches(&listing, request.city_slug) => {
                StrategyOutcome::Matched(Resolved {
                    listing,
                    matched_by: MatchKind::Direct,
                })
            }
            Ok(Some(listing)) => {
                tracing::warn!(
                    "Listing {} is in '{}', not '{}'",
                    id,
                    listing.city,
                    city_from_slug(request.city_slug)
                );
                StrategyOutcome::Miss { store_failed: false }
            }
            Ok(None) => {
                tracing::debug!("Listing {} not found", id);
                StrategyOutcome::Miss { store_failed: false }
            }
            Err(err) => {
                tracing::warn!("Fetching listing {} failed: {}", id, err);
                StrategyOutcome::Miss { store_failed: true }
            }
        }
    }
}

/// Number of slug tokens (type, rooms, surface) the listing matches.
pub fn match_score(listing: &Listing, slug_lower: &str) -> u8 {
    let type_match = slug_lower.contains(&type_token(&listing.property_type))
        || slug_lower.contains(listing.property_type.as_str());
    let rooms_match = listing
        .known_rooms()
        .is_some_and(|rooms| slug_lower.contains(&rooms_token(rooms)));
    let surface_match = listing
        .rounded_surface()
        .is_some_and(|sqm| slug_lower.contains(&surface_token(sqm)));

    [type_match, rooms_match, surface_match]
        .into_iter()
        .filter(|matched| *matched)
        .count() as u8
}

/// Search the city and pick the first candidate matching enough slug tokens,
/// else the first candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct CitySearchFallback;

#[async_trait]
impl ResolutionStrategy for CitySearchFallback {
    fn name(&self) -> &'static str {
        "city-search"
    }

    async fn attempt(&self, gateway: &StoreGateway<'_>, request: ResolveRequest<'_>) -> StrategyOutcome {
        let city = city_from_slug(request.city_slug);
        tracing::debug!("Searching listings in '{}'", city);

        let mut candidates = match gateway.listings_by_city(&city).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!("Searching listings in '{}' failed: {}", city, err);
                return StrategyOutcome::Miss { store_failed: true };
            }
        };
        if candidates.is_empty() {
            return StrategyOutcome::Miss { store_failed: false };
        }

        let slug_lower = request.listing_slug.to_lowercase();
        let scored = candidates
            .iter()
            .map(|candidate| match_score(candidate, &slug_lower))
            .enumerate()
            .find(|(_, score)| *score >= MIN_FALLBACK_SCORE);

        let (index, matched_by) = match scored {
            Some((index, score)) => (index, MatchKind::Scored(score)),
            None => {
                tracing::warn!(
                    "No listing in '{}' matches '{}', using first of {} candidates",
                    city,
                    request.listing_slug,
                    candidates.len()
                );
                (0, MatchKind::FirstCandidate)
            }
        };

        StrategyOutcome::Matched(Resolved {
            listing: candidates.swap_remove(index),
            matched_by,
        })
    }
}

pub struct IdentityResolver<S: ListingStore> {
    store: S,
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    policy: CallPolicy,
}

impl<S: ListingStore> IdentityResolver<S> {
    /// Direct lookup, then city-search fallback.
    pub fn new(store: S) -> Self {
        Self {
            store,
            strategies: vec![Box::new(DirectLookup), Box::new(CitySearchFallback)],
            policy: CallPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Appends a strategy after the existing ones.
    pub fn with_strategy(mut self, strategy: Box<dyn ResolutionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves a listing, failing closed: store errors and misses both give
    /// `None`.
    pub async fn resolve(&self, city_slug: &str, listing_slug: &str) -> Option<Listing> {
        self.resolve_detailed(city_slug, listing_slug).await.into_listing()
    }

    /// Like `resolve`, but tells a miss apart from an unreachable store and
    /// reports how the listing was matched.
    pub async fn resolve_detailed(&self, city_slug: &str, listing_slug: &str) -> Resolution {
        let request = ResolveRequest {
            city_slug,
            listing_slug,
        };
        let gateway = StoreGateway::new(&self.store, &self.policy);
        let mut store_failed = false;

        for strategy in &self.strategies {
            match strategy.attempt(&gateway, request).await {
                StrategyOutcome::Matched(resolved) => {
                    tracing::info!(
                        "Resolved {}/{} to listing {} via {} ({:?})",
                        city_slug,
                        listing_slug,
                        resolved.listing.id,
                        strategy.name(),
                        resolved.matched_by
                    );
                    return Resolution::Found(resolved);
                }
                StrategyOutcome::Miss { store_failed: failed } => {
                    store_failed |= failed;
                }
            }
        }

        if store_failed {
            tracing::warn!("Could not resolve {}/{}: listing store unavailable", city_slug, listing_slug);
            Resolution::Unavailable
        } else {
            tracing::info!("No listing for {}/{}", city_slug, listing_slug);
            Resolution::NotFound
        }
    }
}
