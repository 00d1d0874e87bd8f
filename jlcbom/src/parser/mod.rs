pub mod eagle;
pub mod schema;

// Re-export for convenience
pub use eagle::{EagleParseError, EagleParser, DEFAULT_PART_NUMBER_ATTRIBUTE};
pub use schema::*;
