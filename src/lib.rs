//! Video Comparator - compare two YouTube videos from their transcripts
//!
//! This library fetches the transcripts of two videos, asks a Gemini model for per-video
//! summaries, a side-by-side specification table and a CSV export, and keeps the last
//! exported comparison in a document store so it can be shown again later.

pub mod cli;
pub mod config;
pub mod generation;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod store;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use generation::{GenerationClient, GenerationRequest, GenerationResult, ModelIdentifier};
pub use pipeline::{ComparisonPipeline, ComparisonSession, Stage, StageError};
pub use store::{DocumentStore, ResultStore, StoredComparison};
pub use transcript::{Transcript, TranscriptProvider, TranscriptResolver, VideoReference};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the comparator
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComparatorError {
    #[error("Could not extract a usable video reference from: {0}")]
    InvalidReference(String),

    #[error("Transcript unavailable for video {video_id}: {reason}")]
    TranscriptUnavailable { video_id: String, reason: String },

    #[error("Generation with model {model} failed: {reason}")]
    GenerationFailed { model: String, reason: String },

    #[error("The model returned no {0}")]
    EmptyResult(String),

    #[error("Missing API key: {0} environment variable is not set")]
    MissingApiKey(String),

    #[error("Result store operation failed: {0}")]
    StoreFailed(String),
}
