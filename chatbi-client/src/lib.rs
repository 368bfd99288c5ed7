//! Client for the ChatBI analytics backend.
//!
//! ChatBI answers natural-language business questions two ways:
//! - a flat lookup (`ask`) returning a bounded list of result records, and
//! - a drill-down attribution (`analyze`) decomposing a metric change into
//!   per-dimension positive/negative contributor lists.
//!
//! Both calls report failure as a tagged outcome value, never as `Err`;
//! the caller decides whether a failed question aborts anything. Transport
//! and configuration problems surface through [`Error`].

pub mod client;
pub mod error;
pub mod types;

pub use client::ChatbiClient;
pub use error::Error;
pub use types::{
    AnalyzeData, AnalyzeOutcome, AskOutcome, Contributor, DrillDownDimension, IndicatorCatalog,
};

/// Result type for transport-level client operations.
pub type Result<T> = std::result::Result<T, Error>;
