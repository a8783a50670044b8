use crate::domain::model::Listing;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote listing store the resolver depends on.
///
/// `listing` returns `Ok(None)` when the id is unknown; `Err` is reserved for
/// transport or backend failures.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn listing(&self, id: u64) -> Result<Option<Listing>>;
    async fn listings_by_city(&self, city: &str) -> Result<Vec<Listing>>;
}

#[async_trait]
impl<S: ListingStore + ?Sized> ListingStore for std::sync::Arc<S> {
    async fn listing(&self, id: u64) -> Result<Option<Listing>> {
        (**self).listing(id).await
    }

    async fn listings_by_city(&self, city: &str) -> Result<Vec<Listing>> {
        (**self).listings_by_city(city).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn store_base_url(&self) -> &str;
    fn api_prefix(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}
