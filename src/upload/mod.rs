//! Document upload: file name metadata extraction and the batch orchestrator.

pub mod filename;
pub mod orchestrator;

pub use filename::{FilenameMetadata, MetadataExtractor, DEFAULT_DATE_RULE};
pub use orchestrator::{
    BatchReport, FileReport, ResolvedMetadata, UploadOutcome, UploadRequest, Uploader,
    DEFAULT_RETRY_DELAY, DEFAULT_TRIES,
};
