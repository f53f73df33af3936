use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_comparator::cli::{Cli, Commands};
use video_comparator::config::{Config, API_KEY_ENV};
use video_comparator::generation::{GeminiClient, ModelIdentifier};
use video_comparator::output;
use video_comparator::pipeline::{ComparisonOutcome, ComparisonPipeline, ComparisonSession, ReplayOutcome};
use video_comparator::store::{FileDocumentStore, ResultStore};
use video_comparator::transcript::youtube::YoutubeTranscriptProvider;
use video_comparator::transcript::TranscriptResolver;
use video_comparator::utils;
use video_comparator::ComparatorError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_comparator=debug"
    } else {
        "video_comparator=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Compare {
            first_url,
            second_url,
            model,
            csv_out,
            no_persist,
            skip_summaries,
        } => {
            // The credential is read once, before anything else runs
            let api_key = require_api_key(cli.api_key)?;
            let config = Config::load().await?;
            let pipeline = build_pipeline(&config, api_key)?;

            // Check for required external dependencies (non-fatal)
            let missing_deps = utils::check_dependencies(&config.transcripts.yt_dlp_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let [default_first, default_second] = config.app.default_video_urls.clone();
            let model = model.unwrap_or(config.generation.default_model);
            let mut session = ComparisonSession::new(
                first_url.unwrap_or(default_first),
                second_url.unwrap_or(default_second),
                model,
            );

            tracing::info!(
                "Comparing {} and {} with {} (session {})",
                session.urls()[0],
                session.urls()[1],
                model,
                session.id()
            );

            let progress = output::spinner("Fetching transcripts...", cli.quiet);
            pipeline.resolve_transcripts(&mut session).await;
            progress.finish_and_clear();

            if !skip_summaries {
                let progress = output::spinner("Summarizing videos...", cli.quiet);
                let summaries = pipeline.dual_summary(&mut session).await;
                progress.finish_and_clear();

                for (title, summary) in [
                    ("Summary of Video 1", &summaries.first),
                    ("Summary of Video 2", &summaries.second),
                ] {
                    match summary {
                        Ok(text) => output::print_section(title, text),
                        Err(e) => output::print_stage_error(title, e),
                    }
                }
            }

            let progress = output::spinner("Generating comparison...", cli.quiet);
            let comparison = pipeline.compare(&mut session).await;
            progress.finish_and_clear();

            let comparison = match comparison {
                Ok(outcome) => outcome,
                Err(e) => {
                    output::print_stage_error("Comparison Table", &e);
                    return Err(e.into());
                }
            };
            output::print_comparison(&comparison);
            if comparison == ComparisonOutcome::Empty {
                return Ok(());
            }

            let progress = output::spinner("Exporting CSV...", cli.quiet);
            let export = pipeline.export_csv(&mut session).await;
            progress.finish_and_clear();

            let export = match export {
                Ok(export) => export,
                Err(e) => {
                    output::print_stage_error("CSV Export", &e);
                    return Err(e.into());
                }
            };

            let csv_path = csv_out.unwrap_or_else(|| PathBuf::from(&config.app.csv_file_name));
            output::save_csv(&csv_path, &export.download)?;
            println!();
            println!("CSV saved to: {}", style(csv_path.display()).green());

            if !no_persist {
                match pipeline.persist_csv(&session).await {
                    Ok(Some(stored)) => tracing::info!("Saved as last comparison at {}", stored.updated_at),
                    Ok(None) => tracing::debug!("Result store disabled; comparison not saved"),
                    Err(e) => eprintln!("{} {}", style("warning:").yellow().bold(), e),
                }
            }
        }
        Commands::Replay { model } => {
            let config = Config::load().await?;

            // An empty slot needs no model call, so no key either
            let stored = match build_store(&config)? {
                Some(store) => store.get().await?,
                None => None,
            };
            if stored.is_none() {
                output::print_replay(&ReplayOutcome::NoData);
                return Ok(());
            }

            let api_key = require_api_key(cli.api_key)?;
            let pipeline = build_pipeline(&config, api_key)?;
            let model = model.unwrap_or(config.generation.default_model);

            let progress = output::spinner("Loading last comparison...", cli.quiet);
            let outcome = pipeline.replay_last(model).await;
            progress.finish_and_clear();

            output::print_replay(&outcome?);
        }
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Edit it to change defaults, or run `comparator config --show`.");
            }
        }
        Commands::Models => {
            println!("Supported models:");
            for model in ModelIdentifier::value_variants() {
                let marker = if *model == ModelIdentifier::default() { " (default)" } else { "" };
                println!("  • {}{}", model, marker);
            }
        }
    }

    Ok(())
}

fn require_api_key(api_key: Option<String>) -> Result<String> {
    api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ComparatorError::MissingApiKey(API_KEY_ENV.to_string()).into())
}

fn build_pipeline(config: &Config, api_key: String) -> Result<ComparisonPipeline> {
    let generator = GeminiClient::new(&config.generation, Some(api_key))?;
    let provider = YoutubeTranscriptProvider::new(&config.transcripts);
    let pipeline = ComparisonPipeline::new(
        TranscriptResolver::new(Arc::new(provider)),
        Arc::new(generator),
    );

    match build_store(config)? {
        Some(store) => Ok(pipeline.with_store(store)),
        None => Ok(pipeline),
    }
}

fn build_store(config: &Config) -> Result<Option<ResultStore>> {
    if !config.store.enabled {
        return Ok(None);
    }

    let documents = FileDocumentStore::new(config.store_root()?);
    Ok(Some(ResultStore::new(
        Arc::new(documents),
        config.store.collection.clone(),
        config.store.document_id.clone(),
    )))
}
