//! Data module - CSV loading, cleaning and filtering

mod loader;
mod model;
mod processor;

pub use loader::DataLoader;
pub use model::{CleanedTable, Dataset, Record, SUPPORTED_YEARS};
pub use processor::DataProcessor;
