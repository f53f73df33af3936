use std::fmt;
use std::sync::Arc;

pub mod session;

pub use session::ComparisonSession;

use crate::generation::{GenerationClient, GenerationRequest, ModelIdentifier};
use crate::prompts::{comparison_prompt, csv_prompt, csv_to_markdown_prompt, summary_prompt};
use crate::store::{ResultStore, StoredComparison};
use crate::transcript::{Transcript, TranscriptResolver, TranscriptResult};
use crate::utils::{preview, strip_code_fence};
use crate::ComparatorError;

/// Shown when the comparison generation comes back empty
pub const NO_COMPARISON_MESSAGE: &str = "No comparison data found!";

/// Shown when a replay is requested before anything was stored
pub const NO_STORED_DATA_MESSAGE: &str = "No previous comparison data found.";

/// A step of the pipeline with its own failure domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Summarize,
    Compare,
    ExportCsv,
    Persist,
    Replay,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "transcript"),
            Stage::Summarize => write!(f, "summary"),
            Stage::Compare => write!(f, "comparison"),
            Stage::ExportCsv => write!(f, "csv export"),
            Stage::Persist => write!(f, "persist"),
            Stage::Replay => write!(f, "replay"),
        }
    }
}

/// Failure of a single stage
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: ComparatorError,
}

impl StageError {
    pub fn new(stage: Stage, source: ComparatorError) -> Self {
        Self { stage, source }
    }
}

/// Per-video summaries; each side fails independently
#[derive(Debug, Clone)]
pub struct DualSummary {
    pub first: Result<String, StageError>,
    pub second: Result<String, StageError>,
}

/// Result of the comparison stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Table(String),
    Empty,
}

/// Result of replaying the stored comparison
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    Table {
        table: String,
        stored: StoredComparison,
    },
    NoData,
}

/// CSV produced for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Model output with its header row, as persisted
    pub raw: String,

    /// Data rows only, as offered for download
    pub download: String,
}

impl CsvExport {
    /// Split generated CSV into its persisted and downloadable forms
    pub fn from_generated(text: &str) -> Self {
        let raw = strip_code_fence(text).trim().to_string();
        let download = raw
            .split_once('\n')
            .map(|(_, rows)| rows.to_string())
            .unwrap_or_default();

        Self { raw, download }
    }
}

/// Sequences transcript resolution, prompt building, generation and persistence
pub struct ComparisonPipeline {
    resolver: TranscriptResolver,
    generator: Arc<dyn GenerationClient>,
    store: Option<ResultStore>,
}

impl ComparisonPipeline {
    pub fn new(resolver: TranscriptResolver, generator: Arc<dyn GenerationClient>) -> Self {
        Self {
            resolver,
            generator,
            store: None,
        }
    }

    /// Persist exports and enable replay through this store
    pub fn with_store(mut self, store: ResultStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve both transcripts once per session
    pub async fn resolve_transcripts<'s>(
        &self,
        session: &'s mut ComparisonSession,
    ) -> &'s [TranscriptResult; 2] {
        let transcripts = match session.transcripts.take() {
            Some(transcripts) => transcripts,
            None => {
                let [first, second] = session.urls();
                let (first, second) =
                    tokio::join!(self.resolver.resolve(first), self.resolver.resolve(second));

                for (index, result) in [&first, &second].into_iter().enumerate() {
                    if let Err(e) = result {
                        tracing::warn!("Video {}: {}", index + 1, e);
                    }
                }
                [first, second]
            }
        };

        session.transcripts.insert(transcripts)
    }

    /// Summarize each video independently
    pub async fn dual_summary(&self, session: &mut ComparisonSession) -> DualSummary {
        let model = session.model();
        let [first, second] = self.resolve_transcripts(session).await;

        let (first, second) = tokio::join!(
            self.summarize(first, model),
            self.summarize(second, model)
        );

        DualSummary { first, second }
    }

    async fn summarize(
        &self,
        transcript: &TranscriptResult,
        model: ModelIdentifier,
    ) -> Result<String, StageError> {
        let transcript = transcript
            .as_ref()
            .map_err(|e| StageError::new(Stage::Resolve, e.clone()))?;

        tracing::info!("Summarizing video {}", transcript.video_id());
        self.generate(Stage::Summarize, summary_prompt(transcript.text()), model)
            .await
    }

    /// Build the side-by-side comparison table
    pub async fn compare(
        &self,
        session: &mut ComparisonSession,
    ) -> Result<ComparisonOutcome, StageError> {
        let model = session.model();
        let (first, second) = both(self.resolve_transcripts(session).await)?;
        let prompt = comparison_prompt(first.text(), second.text());

        tracing::info!("Generating comparison with {}", model);
        let text = self.generate(Stage::Compare, prompt, model).await?;

        if text.trim().is_empty() {
            tracing::warn!("{}", NO_COMPARISON_MESSAGE);
            return Ok(ComparisonOutcome::Empty);
        }

        Ok(ComparisonOutcome::Table(text))
    }

    /// Generate the CSV export, reusing the session's cached export if present
    pub async fn export_csv(&self, session: &mut ComparisonSession) -> Result<CsvExport, StageError> {
        if let Some(export) = session.csv_export() {
            tracing::debug!("Reusing CSV export of session {}", session.id());
            return Ok(export.clone());
        }

        let model = session.model();
        let (first, second) = both(self.resolve_transcripts(session).await)?;
        let prompt = csv_prompt(first.text(), second.text());

        tracing::info!("Generating CSV export with {}", model);
        let text = self.generate(Stage::ExportCsv, prompt, model).await?;

        let export = CsvExport::from_generated(&text);
        if export.raw.trim().is_empty() {
            return Err(StageError::new(
                Stage::ExportCsv,
                ComparatorError::EmptyResult("CSV data".to_string()),
            ));
        }

        session.csv_export = Some(export.clone());
        Ok(export)
    }

    /// Write the session's CSV export, header included, to the result store.
    ///
    /// Returns `None` when the pipeline has no store.
    pub async fn persist_csv(
        &self,
        session: &ComparisonSession,
    ) -> Result<Option<StoredComparison>, StageError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let export = session.csv_export().ok_or_else(|| {
            StageError::new(
                Stage::Persist,
                ComparatorError::StoreFailed("no CSV export in this session".to_string()),
            )
        })?;

        store
            .put(&export.raw, session.id())
            .await
            .map(Some)
            .map_err(|e| StageError::new(Stage::Persist, ComparatorError::StoreFailed(format!("{:#}", e))))
    }

    /// Show the stored comparison again, re-rendered as a table
    pub async fn replay_last(&self, model: ModelIdentifier) -> Result<ReplayOutcome, StageError> {
        let Some(store) = &self.store else {
            return Ok(ReplayOutcome::NoData);
        };

        let stored = store
            .get()
            .await
            .map_err(|e| StageError::new(Stage::Replay, ComparatorError::StoreFailed(format!("{:#}", e))))?;

        let Some(stored) = stored else {
            tracing::info!("{}", NO_STORED_DATA_MESSAGE);
            return Ok(ReplayOutcome::NoData);
        };

        tracing::info!(
            "Replaying comparison stored by session {} at {}",
            stored.session_id,
            stored.updated_at
        );
        let table = self
            .generate(Stage::Replay, csv_to_markdown_prompt(&stored.csv), model)
            .await?;

        Ok(ReplayOutcome::Table { table, stored })
    }

    async fn generate(
        &self,
        stage: Stage,
        prompt: String,
        model: ModelIdentifier,
    ) -> Result<String, StageError> {
        let request = GenerationRequest::new(prompt, model);

        let result = self.generator.generate(&request).await.map_err(|e| {
            tracing::error!("{} generation via {} failed: {:#}", stage, self.generator.service_name(), e);
            StageError::new(
                stage,
                ComparatorError::GenerationFailed {
                    model: model.to_string(),
                    reason: format!("{:#}", e),
                },
            )
        })?;

        tracing::debug!(
            "{} result ({:?}): {}",
            stage,
            result.finish_reason,
            preview(&result.text, 80)
        );

        Ok(result.text)
    }
}

/// Both transcripts, or the first resolution failure
fn both(transcripts: &[TranscriptResult; 2]) -> Result<(&Transcript, &Transcript), StageError> {
    match transcripts {
        [Ok(first), Ok(second)] => Ok((first, second)),
        [Err(e), _] | [_, Err(e)] => Err(StageError::new(Stage::Resolve, e.clone())),
    }
}
