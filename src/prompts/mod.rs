//! Prompt templates for the comparison tasks.
//!
//! Every builder is a pure function of its inputs. Transcript and stored data are embedded
//! verbatim; nothing is escaped or shortened.

/// Header row of the CSV export
pub const CSV_HEADER: &str = r#""Feature","Phone 1","Phone 2""#;

const PERSONA: &str = "You are a Technical Blogger for the smartphone industry";

/// Numeric specifications every comparison must cover
pub const NUMERIC_SPECS: [&str; 5] = [
    "screen size",
    "resolution",
    "camera resolution (megapixels)",
    "battery capacity",
    "chipset performance",
];

/// Qualitative attributes every comparison must cover
pub const QUALITATIVE_ATTRIBUTES: [&str; 3] = ["build quality", "user experience", "durability"];

/// Checklist shared by the comparison and CSV prompts
fn attribute_checklist() -> String {
    format!(
        "- Numeric specifications: {}.\n- Qualitative attributes: {}.",
        NUMERIC_SPECS.join(", "),
        QUALITATIVE_ATTRIBUTES.join(", ")
    )
}

fn transcript_pair(first: &str, second: &str) -> String {
    format!("Transcript 1:\n{first}\n\nTranscript 2:\n{second}")
}

/// Ask for a three part summary of one video
pub fn summary_prompt(transcript: &str) -> String {
    format!(
        "{PERSONA}, tasked with summarizing specifications from transcripts.

Analyze the following transcript and generate a summary.

Return only these three sections:
- Key Highlights
- Parameters Considered for the Ranking
- Best Feature-wise, Budget and Overall

Below is the transcript:
{transcript}

Keep it concise and in layman terms. Do not add any data that is not in the transcript."
    )
}

/// Ask for a readable side-by-side comparison table of two videos
pub fn comparison_prompt(first: &str, second: &str) -> String {
    format!(
        "{PERSONA}, tasked with comparing specifications from transcripts.

Analyze the following transcripts and generate a table comparing the two phones' specifications and features.

{pairs}

Please include:
{checklist}

Format the output in a clear tabular structure.",
        pairs = transcript_pair(first, second),
        checklist = attribute_checklist(),
    )
}

/// Ask for the same comparison as strict CSV
pub fn csv_prompt(first: &str, second: &str) -> String {
    format!(
        "{PERSONA}. Analyze the following transcripts and return the comparison strictly in CSV format.

{pairs}

Ensure:
{checklist}
- No additional text or commentary. Return only valid CSV data with every field double-quoted.

Output example:
{CSV_HEADER}
\"Screen Size\",\"6.1 inches\",\"6.5 inches\"
\"Battery\",\"4000 mAh\",\"4500 mAh\"",
        pairs = transcript_pair(first, second),
        checklist = attribute_checklist(),
    )
}

/// Ask for a stored CSV comparison to be shown as a table again
pub fn csv_to_markdown_prompt(stored: &str) -> String {
    format!(
        "{PERSONA}. Below is a comparison of two phones that was generated earlier, in CSV format.

{stored}

Present this data as a clear comparison table covering:
{checklist}

Use only the facts present in the data above. Do not add, infer or change any values.",
        checklist = attribute_checklist(),
    )
}
