use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod youtube;

use crate::{ComparatorError, Result};

/// Marker that precedes the video id in a watch URL
const REFERENCE_MARKER: &str = "v=";

/// Identifier of a single video, as parsed out of a user supplied URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoReference(String);

impl VideoReference {
    /// Parse a reference out of a URL without validating it
    pub fn from_url(url: &str) -> Self {
        Self(extract_video_id(url).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the reference looks like an id a provider can look up
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Take everything after the last `v=` and cut it at the first `&`.
///
/// Input without a `v=` marker comes back whole.
pub fn extract_video_id(url: &str) -> &str {
    let tail = url
        .rsplit_once(REFERENCE_MARKER)
        .map(|(_, tail)| tail)
        .unwrap_or(url);

    tail.split('&').next().unwrap_or(tail)
}

/// One caption fragment as delivered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Caption text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Flattened caption text of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    video_id: VideoReference,
    text: String,
}

impl Transcript {
    /// Join fragments in the order given, dropping their timing
    pub fn from_fragments(video_id: VideoReference, fragments: &[TranscriptFragment]) -> Self {
        let text = fragments
            .iter()
            .map(|fragment| fragment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Self { video_id, text }
    }

    pub fn video_id(&self) -> &VideoReference {
        &self.video_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Outcome of resolving one video: either its transcript or the reason it is missing
pub type TranscriptResult = std::result::Result<Transcript, ComparatorError>;

/// Source of caption fragments for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the caption fragments of a video in temporal order
    async fn fetch_transcript(&self, video_id: &VideoReference) -> Result<Vec<TranscriptFragment>>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Turns user supplied URLs into transcripts
#[derive(Clone)]
pub struct TranscriptResolver {
    provider: Arc<dyn TranscriptProvider>,
}

impl TranscriptResolver {
    pub fn new(provider: Arc<dyn TranscriptProvider>) -> Self {
        Self { provider }
    }

    pub async fn resolve(&self, url: &str) -> TranscriptResult {
        let video_id = VideoReference::from_url(url);
        if !video_id.is_valid() {
            tracing::warn!("Rejecting input without a usable video reference: {}", url);
            return Err(ComparatorError::InvalidReference(url.to_string()));
        }

        tracing::info!(
            "Fetching transcript for video {} via {}",
            video_id,
            self.provider.provider_name()
        );

        let fragments = self
            .provider
            .fetch_transcript(&video_id)
            .await
            .map_err(|e| ComparatorError::TranscriptUnavailable {
                video_id: video_id.to_string(),
                reason: format!("{:#}", e),
            })?;

        let transcript = Transcript::from_fragments(video_id, &fragments);
        if transcript.is_empty() {
            return Err(ComparatorError::TranscriptUnavailable {
                video_id: transcript.video_id().to_string(),
                reason: "no captions available".to_string(),
            });
        }

        tracing::debug!(
            "Resolved transcript for {} ({} fragments, {} chars)",
            transcript.video_id(),
            fragments.len(),
            transcript.text().len()
        );

        Ok(transcript)
    }
}
