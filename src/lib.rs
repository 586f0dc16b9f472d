pub use catalog::{Catalog, CatalogRecord, DrsScheme, ScanRoot};
pub use config::RunConfig;
pub use error::{CatalogError, ConfigError};
pub use recipe::{DatasetEntry, Diagnostic, FillReport, OneOrMany, Recipe, VariableBlock};
pub use request::{
    Constraint, ExperimentFilter, RawRequest, VariableRequest, YearRange, YearSpec, WILDCARD,
};
pub use select::{find_datasets, AggregatedSelection, Segment};

/// Result alias used throughout the crate and its binaries.
pub type RecFillResult<T> = Result<T, Box<dyn std::error::Error>>;

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod catalog;
mod config;
mod error;
mod recipe;
mod request;
mod select;
