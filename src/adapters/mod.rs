// Adapters layer: concrete listing stores behind the `ListingStore` port.

pub mod http;
pub mod memory;

pub use http::HttpListingStore;
pub use memory::InMemoryListingStore;
