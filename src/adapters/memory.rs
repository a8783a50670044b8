use crate::domain::model::Listing;
use crate::domain::ports::ListingStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

/// Listing store held in memory, ordered by id. Loaded from a JSON array of
/// listings for offline use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryListingStore {
    listings: BTreeMap<u64, Listing>,
}

impl InMemoryListingStore {
    pub fn new(listings: impl IntoIterator<Item = Listing>) -> Self {
        Self {
            listings: listings.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let listings: Vec<Listing> = serde_json::from_str(content)?;
        Ok(Self::new(listings))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn listing(&self, id: u64) -> Result<Option<Listing>> {
        Ok(self.listings.get(&id).cloned())
    }

    async fn listings_by_city(&self, city: &str) -> Result<Vec<Listing>> {
        let wanted = city.trim().to_lowercase();
        Ok(self
            .listings
            .values()
            .filter(|l| l.city.trim().to_lowercase() == wanted)
            .cloned()
            .collect())
    }
}
