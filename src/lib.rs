//! Canadian respiratory virus detection (RVDSS) scraper.
//!
//! Locates the current weekly dataset on the publisher's landing page, parses
//! its per-virus tables, and reshapes them into one long-form record set keyed
//! by (week, region, virus).

pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod snapshot;
pub mod view;

pub use config::Config;
pub use dataset::{Dataset, DatasetSummary};
pub use error::{PipelineError, Result};
pub use pipeline::{build_dataset, HttpSource};
pub use snapshot::{DatasetSnapshot, DatasetSource, SnapshotStatus};
