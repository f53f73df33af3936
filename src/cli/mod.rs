use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::API_KEY_ENV;
use crate::generation::ModelIdentifier;

#[derive(Parser)]
#[command(
    name = "comparator",
    about = "Video Comparator - compare two YouTube videos from their transcripts using Gemini",
    version,
    long_about = "Fetches the transcripts of two YouTube videos, summarizes each one, builds a side-by-side specification comparison and exports it as CSV. The last exported comparison is saved and can be shown again with `replay`."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Gemini API key
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize and compare two videos
    Compare {
        /// First video URL (defaults to the configured example)
        #[arg(value_name = "URL1")]
        first_url: Option<String>,

        /// Second video URL (defaults to the configured example)
        #[arg(value_name = "URL2")]
        second_url: Option<String>,

        /// Gemini model to use for every generation in this run
        #[arg(short, long, value_enum)]
        model: Option<ModelIdentifier>,

        /// Where to write the CSV download (defaults to the configured file name)
        #[arg(long, value_name = "FILE")]
        csv_out: Option<PathBuf>,

        /// Do not save the CSV as the last comparison
        #[arg(long)]
        no_persist: bool,

        /// Skip the per-video summaries
        #[arg(long)]
        skip_summaries: bool,
    },

    /// Show the last saved comparison as a table
    Replay {
        /// Gemini model used to render the table
        #[arg(short, long, value_enum)]
        model: Option<ModelIdentifier>,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported Gemini models
    Models,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compare() {
        let cli = Cli::try_parse_from([
            "comparator",
            "compare",
            "https://www.youtube.com/watch?v=a",
            "https://www.youtube.com/watch?v=b",
            "--model",
            "gemini-2.0-flash-exp",
            "--no-persist",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare {
                first_url,
                second_url,
                model,
                no_persist,
                skip_summaries,
                ..
            } => {
                assert_eq!(first_url.as_deref(), Some("https://www.youtube.com/watch?v=a"));
                assert_eq!(second_url.as_deref(), Some("https://www.youtube.com/watch?v=b"));
                assert_eq!(model, Some(ModelIdentifier::Gemini20FlashExp));
                assert!(no_persist);
                assert!(!skip_summaries);
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["comparator", "replay", "--model", "gpt-4"]).is_err());
    }
}
