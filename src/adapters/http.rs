use crate::domain::model::Listing;
use crate::domain::ports::{ConfigProvider, ListingStore};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// `ListingStore` backed by the marketplace REST API.
#[derive(Debug, Clone)]
pub struct HttpListingStore {
    client: Client,
    base: Url,
}

impl HttpListingStore {
    pub fn new(base_url: &str, api_prefix: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| MarketError::InvalidConfigValue {
            field: "store.base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        // Trailing slash so that `join` appends below the prefix.
        let segments: Vec<String> = base
            .path()
            .split('/')
            .chain(api_prefix.split('/'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            base.set_path("/");
        } else {
            base.set_path(&format!("/{}/", segments.join("/")));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.store_base_url(), config.api_prefix(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| MarketError::store("build url", e.to_string()))
    }

    fn status_error(operation: &str, status: StatusCode) -> MarketError {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            MarketError::store(operation, format!("HTTP {}", status))
        } else {
            MarketError::StoreRejected {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
        }
    }
}

/// Search responses come either as a bare array or wrapped in `items` /
/// `properties`.
fn candidates_from(payload: serde_json::Value) -> Result<Vec<Listing>> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("items").or_else(|| obj.remove("properties")) {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut listings = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Listing>(item) {
            Ok(listing) => listings.push(listing),
            Err(e) => tracing::warn!("Skipping malformed listing in search results: {}", e),
        }
    }
    Ok(listings)
}

#[async_trait]
impl ListingStore for HttpListingStore {
    async fn listing(&self, id: u64) -> Result<Option<Listing>> {
        let url = self.endpoint(&format!("properties/{}", id))?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        tracing::debug!("Listing {} response status: {}", id, status);

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::status_error("listing", status));
        }

        Ok(Some(response.json::<Listing>().await?))
    }

    async fn listings_by_city(&self, city: &str) -> Result<Vec<Listing>> {
        let mut url = self.endpoint("properties/search")?;
        url.query_pairs_mut().append_pair("city", city);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error("listings_by_city", status));
        }

        let payload: serde_json::Value = response.json().await?;
        let listings = candidates_from(payload)?;
        tracing::debug!("Search in '{}' returned {} listings", city, listings.len());
        Ok(listings)
    }
}
