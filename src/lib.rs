pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{HttpListingStore, InMemoryListingStore};
pub use crate::core::deal::{deal_score, DealLevel, DealScore};
pub use crate::core::merit::{MeritBreakdown, MeritFactors};
pub use crate::core::resolver::{CallPolicy, IdentityResolver, MatchKind, Resolution, RetryPolicy};
pub use crate::core::surface::{commercial_surface, CommercialSurface, SurfaceInput};
pub use crate::core::valuation::{CoefficientTable, FiscalValue, ValuationEngine, ValuationRequest};
pub use domain::model::{CoefficientBracket, Listing, PropertyType, ValuationQuote};
pub use domain::ports::{ConfigProvider, ListingStore};
pub use utils::error::{MarketError, Result};
