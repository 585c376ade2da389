pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::LocalStorage;
pub use crate::core::{
    cleaner::Cleaner, etl::EtlEngine, etl::RunSummary, pipeline::IngestPipeline,
    resolver::SourceResolver, sink::SinkWriter,
};
pub use domain::model::{
    CleanOptions, CleaningReport, ColumnType, Dataset, MissingValuePolicy, SinkDescriptor,
    SourceDescriptor,
};
pub use utils::error::{EtlError, Result};
