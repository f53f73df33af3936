use assert_cmd::Command;
use predicates::prelude::*;

fn comparator() -> Command {
    let mut cmd = Command::cargo_bin("comparator").unwrap();
    cmd.env_remove("API_KEY").env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_models_lists_every_identifier() {
    comparator()
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini-1.5-pro (default)"))
        .stdout(predicate::str::contains("gemini-1.5-flash"))
        .stdout(predicate::str::contains("gemini-2.0-flash-exp"));
}

#[test]
fn test_compare_without_api_key_fails_fast() {
    comparator()
        .args(["compare", "https://www.youtube.com/watch?v=a", "https://www.youtube.com/watch?v=b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API_KEY"));
}

/// Working directory with a local config pointing the store inside it
fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    let config = format!("store:\n  path: {:?}\n", store.display().to_string());
    fs_err::write(dir.path().join("config.yaml"), config).unwrap();
    dir
}

#[test]
fn test_replay_with_empty_store_needs_no_api_key() {
    let dir = workspace();

    comparator()
        .current_dir(dir.path())
        .arg("replay")
        .assert()
        .success()
        .stdout(predicate::str::contains("No previous comparison data found."));
}

#[test]
fn test_replay_of_stored_comparison_requires_api_key() {
    let dir = workspace();
    let slot = dir.path().join("store").join("comparisons");
    fs_err::create_dir_all(&slot).unwrap();
    fs_err::write(
        slot.join("last_comparison.json"),
        r#"{
            "csv": "\"Feature\",\"Phone 1\",\"Phone 2\"\n\"Battery\",\"4000 mAh\",\"4500 mAh\"",
            "session_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "updated_at": "2024-11-02T10:15:00Z"
        }"#,
    )
    .unwrap();

    comparator()
        .current_dir(dir.path())
        .arg("replay")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing API key"));
}

#[test]
fn test_rejects_unknown_model() {
    comparator()
        .args(["compare", "--model", "gpt-4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gemini-1.5-pro"));
}
