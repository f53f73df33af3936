use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use video_comparator::generation::{GenerationClient, GenerationRequest, GenerationResult, ModelIdentifier};
use video_comparator::pipeline::{ComparisonOutcome, ComparisonPipeline, ComparisonSession, ReplayOutcome, Stage};
use video_comparator::prompts::csv_to_markdown_prompt;
use video_comparator::store::{FileDocumentStore, MemoryDocumentStore, ResultStore};
use video_comparator::transcript::{TranscriptFragment, TranscriptProvider, TranscriptResolver, VideoReference};
use video_comparator::ComparatorError;

const CSV_REPLY: &str = "\"Feature\",\"Phone 1\",\"Phone 2\"\n\"Screen Size\",\"6.1 inches\",\"6.5 inches\"";

/// Serves canned captions per video id
struct FakeCaptions {
    calls: AtomicUsize,
}

#[async_trait]
impl TranscriptProvider for FakeCaptions {
    async fn fetch_transcript(&self, video_id: &VideoReference) -> anyhow::Result<Vec<TranscriptFragment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match video_id.as_str() {
            "no_captions" => anyhow::bail!("Subtitles are disabled for this video"),
            id => Ok(vec![
                TranscriptFragment {
                    text: format!("{} has a 6.1 inch screen", id),
                    start: 0.0,
                    duration: 2.0,
                },
                TranscriptFragment {
                    text: "and a 4000 mAh battery".to_string(),
                    start: 2.0,
                    duration: 2.0,
                },
            ]),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake captions"
    }
}

/// Answers by task and records every prompt
#[derive(Default)]
struct ScriptedModel {
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedModel {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GenerationResult> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let text = if request.prompt.contains("strictly in CSV format") {
            CSV_REPLY.to_string()
        } else if request.prompt.contains("generated earlier") {
            "| Feature | Phone 1 | Phone 2 |\n|---|---|---|\n| Screen Size | 6.1 inches | 6.5 inches |".to_string()
        } else if request.prompt.contains("comparing the two phones") {
            "| Feature | Phone 1 | Phone 2 |".to_string()
        } else {
            "**Key Highlights**: big battery".to_string()
        };

        Ok(GenerationResult {
            text,
            model: request.model,
            finish_reason: None,
        })
    }

    fn service_name(&self) -> &'static str {
        "scripted model"
    }
}

fn build(store: ResultStore) -> (Arc<FakeCaptions>, Arc<ScriptedModel>, ComparisonPipeline) {
    let captions = Arc::new(FakeCaptions {
        calls: AtomicUsize::new(0),
    });
    let model = Arc::new(ScriptedModel::default());
    let pipeline = ComparisonPipeline::new(TranscriptResolver::new(captions.clone()), model.clone())
        .with_store(store);
    (captions, model, pipeline)
}

fn memory_slot() -> ResultStore {
    ResultStore::new(Arc::new(MemoryDocumentStore::new()), "comparisons", "last_comparison")
}

#[tokio::test]
async fn test_full_comparison_then_replay() {
    let store = memory_slot();
    let (captions, model, pipeline) = build(store.clone());
    let mut session = ComparisonSession::new(
        "https://www.youtube.com/watch?v=phone_a",
        "https://www.youtube.com/watch?v=phone_b&t=3",
        ModelIdentifier::Gemini15Pro,
    );

    let summaries = pipeline.dual_summary(&mut session).await;
    assert!(summaries.first.unwrap().contains("Key Highlights"));
    assert!(summaries.second.is_ok());

    let comparison = pipeline.compare(&mut session).await.unwrap();
    assert_eq!(comparison, ComparisonOutcome::Table("| Feature | Phone 1 | Phone 2 |".to_string()));

    let export = pipeline.export_csv(&mut session).await.unwrap();
    assert_eq!(export.download, "\"Screen Size\",\"6.1 inches\",\"6.5 inches\"");

    let stored = pipeline.persist_csv(&session).await.unwrap().unwrap();
    assert_eq!(stored.csv, CSV_REPLY);

    // One fetch per video across all stages
    assert_eq!(captions.calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.prompts().len(), 4);
    assert!(model.prompts()[2].contains("phone_a has a 6.1 inch screen\nand a 4000 mAh battery"));

    let replay = pipeline.replay_last(ModelIdentifier::Gemini15Flash).await.unwrap();
    match replay {
        ReplayOutcome::Table { table, stored } => {
            assert!(table.contains("| Screen Size | 6.1 inches | 6.5 inches |"));
            assert_eq!(stored.session_id, session.id());
        }
        ReplayOutcome::NoData => panic!("expected the stored comparison"),
    }
    assert_eq!(model.prompts().last().unwrap(), &csv_to_markdown_prompt(CSV_REPLY));
}

#[tokio::test]
async fn test_replay_on_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::new(Arc::new(FileDocumentStore::new(dir.path())), "comparisons", "last_comparison");
    let (_, model, pipeline) = build(store);

    let outcome = pipeline.replay_last(ModelIdentifier::Gemini15Pro).await.unwrap();

    assert_eq!(outcome, ReplayOutcome::NoData);
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn test_stored_comparison_survives_a_new_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let slot = || ResultStore::new(Arc::new(FileDocumentStore::new(dir.path())), "comparisons", "last_comparison");

    let (_, _, first_run) = build(slot());
    let mut session = ComparisonSession::new("watch?v=phone_a", "watch?v=phone_b", ModelIdentifier::Gemini15Pro);
    first_run.export_csv(&mut session).await.unwrap();
    first_run.persist_csv(&session).await.unwrap();

    let (captions, _, second_run) = build(slot());
    let outcome = second_run.replay_last(ModelIdentifier::Gemini15Pro).await.unwrap();

    assert!(matches!(outcome, ReplayOutcome::Table { .. }));
    assert_eq!(captions.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_captions_stop_dependent_stages() {
    let (_, model, pipeline) = build(memory_slot());
    let mut session = ComparisonSession::new(
        "https://www.youtube.com/watch?v=phone_a",
        "https://www.youtube.com/watch?v=no_captions",
        ModelIdentifier::Gemini15Pro,
    );

    let summaries = pipeline.dual_summary(&mut session).await;
    assert!(summaries.first.is_ok());
    let err = summaries.second.unwrap_err();
    assert_eq!(err.stage, Stage::Resolve);
    assert!(err.to_string().contains("Subtitles are disabled"));

    assert_eq!(pipeline.compare(&mut session).await.unwrap_err().stage, Stage::Resolve);
    assert_eq!(pipeline.export_csv(&mut session).await.unwrap_err().stage, Stage::Resolve);

    // Only the healthy video's summary reached the model
    assert_eq!(model.prompts().len(), 1);
    assert!(model.prompts().iter().all(|p| !p.contains("Subtitles are disabled")));
}

#[tokio::test]
async fn test_malformed_url_is_rejected_before_fetching() {
    let (captions, model, pipeline) = build(memory_slot());
    let mut session = ComparisonSession::new("https://youtu.be/phone_a", "watch?v=phone_b", ModelIdentifier::Gemini15Pro);

    let err = pipeline.compare(&mut session).await.unwrap_err();

    assert_eq!(err.source, ComparatorError::InvalidReference("https://youtu.be/phone_a".to_string()));
    assert_eq!(captions.calls.load(Ordering::SeqCst), 1);
    assert!(model.prompts().is_empty());
}
