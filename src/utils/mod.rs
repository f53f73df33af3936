/// Remove a surrounding Markdown code fence (```` ```csv ... ``` ````) from model output.
///
/// Text that does not start with a fence is returned untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.trim().strip_prefix("```") else {
        return text;
    };
    let Some((_, body)) = rest.split_once('\n') else {
        return text;
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim_matches(|c: char| c == '\n' || c == '\r')
}

/// First `max_chars` characters of a text, for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head.replace('\n', " "))
    } else {
        head.replace('\n', " ")
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!("{} - required for fetching YouTube captions", yt_dlp_path));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```csv\n\"a\",\"b\"\n\"c\",\"d\"\n```"), "\"a\",\"b\"\n\"c\",\"d\"");
        assert_eq!(strip_code_fence("```\nx\n```\n"), "x");
        assert_eq!(strip_code_fence("```\nunterminated"), "unterminated");
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text_alone() {
        let plain = "\"Feature\",\"Phone 1\",\"Phone 2\"\n\"Screen Size\",\"6.1 inches\",\"6.5 inches\"\n";
        assert_eq!(strip_code_fence(plain), plain);
        assert_eq!(strip_code_fence("```"), "```");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline two", 8), "line one...");
        assert_eq!(preview("", 3), "");
    }

    #[tokio::test]
    async fn test_missing_command_is_reported() {
        let missing = check_dependencies("definitely-not-a-real-yt-dlp-binary").await;
        assert_eq!(missing.len(), 1);
        assert!(missing[0].starts_with("definitely-not-a-real-yt-dlp-binary"));
    }
}
