pub mod analysis;
pub mod cleaner;
pub mod decode;
pub mod etl;
pub mod pipeline;
pub mod resolver;
pub mod sink;

pub use crate::domain::model::{
    CleanOptions, CleaningReport, Dataset, LoadReport, MissingValuePolicy, SinkDescriptor,
    SourceDescriptor, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
