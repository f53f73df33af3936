use uuid::Uuid;

use super::CsvExport;
use crate::generation::ModelIdentifier;
use crate::transcript::TranscriptResult;

/// State of one comparison run.
///
/// Transcripts are resolved at most once per session and shared by every stage; the CSV
/// export is cached so repeated downloads do not call the model again.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    id: Uuid,
    model: ModelIdentifier,
    urls: [String; 2],
    pub(super) transcripts: Option<[TranscriptResult; 2]>,
    pub(super) csv_export: Option<CsvExport>,
}

impl ComparisonSession {
    pub fn new(first_url: impl Into<String>, second_url: impl Into<String>, model: ModelIdentifier) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            urls: [first_url.into(), second_url.into()],
            transcripts: None,
            csv_export: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> ModelIdentifier {
        self.model
    }

    pub fn urls(&self) -> &[String; 2] {
        &self.urls
    }

    /// Transcripts, once resolved
    pub fn transcripts(&self) -> Option<&[TranscriptResult; 2]> {
        self.transcripts.as_ref()
    }

    /// CSV export, once generated
    pub fn csv_export(&self) -> Option<&CsvExport> {
        self.csv_export.as_ref()
    }
}
