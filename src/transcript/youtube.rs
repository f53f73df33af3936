use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use super::{TranscriptFragment, TranscriptProvider, VideoReference};
use crate::config::TranscriptConfig;
use crate::Result;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const PREFERRED_FORMAT: &str = "json3";

/// YouTube caption provider using yt-dlp for track discovery
pub struct YoutubeTranscriptProvider {
    yt_dlp_path: String,
    languages: Vec<String>,
    include_auto_captions: bool,
    client: Client,
}

/// A caption track advertised by yt-dlp
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language: String,
    pub url: String,
    pub automatic: bool,
}

#[derive(Debug, Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

impl YoutubeTranscriptProvider {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            languages: config.languages.clone(),
            include_auto_captions: config.include_auto_captions,
            client: Client::new(),
        }
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, video_id: &VideoReference) -> Result<Value> {
        let mut watch_url = Url::parse(WATCH_URL)?;
        watch_url.query_pairs_mut().append_pair("v", video_id.as_str());

        tracing::debug!("Listing caption tracks for: {}", watch_url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--skip-download", "--no-playlist", watch_url.as_str()])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let info: Value = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    /// Download a json3 caption track and turn it into fragments
    async fn download_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptFragment>> {
        tracing::debug!(
            "Downloading {} captions ({})",
            track.language,
            if track.automatic { "automatic" } else { "manual" }
        );

        let response = self.client.get(&track.url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to download captions: HTTP {}", response.status());
        }

        let body = response.text().await?;
        parse_json3(&body)
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeTranscriptProvider {
    async fn fetch_transcript(&self, video_id: &VideoReference) -> Result<Vec<TranscriptFragment>> {
        let info = self.get_video_info(video_id).await?;

        let track = select_caption_track(&info, &self.languages, self.include_auto_captions)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No captions found for languages: {}",
                    self.languages.join(", ")
                )
            })?;

        self.download_track(&track).await
    }

    fn provider_name(&self) -> &'static str {
        "YouTube"
    }
}

/// Pick the best caption track from yt-dlp's video info.
///
/// Manual subtitles beat automatic captions; within each kind the language list is tried
/// in order. A `json3` rendition is preferred, otherwise the first listed format is used.
pub fn select_caption_track(
    info: &Value,
    languages: &[String],
    include_auto_captions: bool,
) -> Option<CaptionTrack> {
    let mut sources = vec![("subtitles", false)];
    if include_auto_captions {
        sources.push(("automatic_captions", true));
    }

    for (key, automatic) in sources {
        let Some(tracks) = info[key].as_object() else {
            continue;
        };

        for wanted in languages {
            // Exact tag first, then regional variants such as `en-US`
            let region_prefix = format!("{}-", wanted);
            let exact = tracks.get(wanted.as_str()).map(|formats| (wanted, formats));
            let regional = tracks
                .iter()
                .filter(|(lang, _)| lang.starts_with(&region_prefix));

            for (lang, formats) in exact.into_iter().chain(regional) {
                if let Some(url) = pick_format_url(formats) {
                    return Some(CaptionTrack {
                        language: lang.clone(),
                        url,
                        automatic,
                    });
                }
            }
        }
    }

    None
}

fn pick_format_url(formats: &Value) -> Option<String> {
    let formats = formats.as_array()?;
    let url_of = |format: &Value| format["url"].as_str().map(|s| s.to_string());

    let preferred = formats
        .iter()
        .find(|format| format["ext"].as_str() == Some(PREFERRED_FORMAT))
        .and_then(url_of);

    let url = preferred.or_else(|| formats.iter().find_map(url_of))?;

    // YouTube serves any track as json3 when asked via the fmt parameter
    let mut parsed = Url::parse(&url).ok()?;
    let others: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(others)
        .append_pair("fmt", PREFERRED_FORMAT);

    Some(parsed.to_string())
}

/// Parse YouTube's json3 caption format into fragments
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptFragment>> {
    let captions: Json3Captions =
        serde_json::from_str(body).context("Failed to parse json3 captions")?;

    let fragments = captions
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }

            Some(TranscriptFragment {
                text,
                start: event.start_ms as f64 / 1000.0,
                duration: event.duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    Ok(fragments)
}
