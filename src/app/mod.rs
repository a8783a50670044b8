pub mod batch;
pub mod estimate;

pub use batch::{quote_csv, BatchSummary, RowStatus};
pub use estimate::{estimate, EstimateInput, PropertyEstimate};
