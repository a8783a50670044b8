pub mod deal;
pub mod format;
pub mod merit;
pub mod resolver;
pub mod slug;
pub mod surface;
pub mod valuation;

pub use crate::domain::model::{CoefficientBracket, Listing, PropertyType, ValuationQuote};
pub use crate::domain::ports::{ConfigProvider, ListingStore};
pub use crate::utils::error::Result;
