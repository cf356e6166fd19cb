use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn scribe(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("playlist-scribe").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env_remove("RUST_LOG")
        .env_remove("PLAYLIST_SCRIBE_USER");
    cmd
}

#[test]
fn test_subtitles_prints_srt() {
    let home = TempDir::new().unwrap();
    let transcript = home.path().join("talk.txt");
    fs_err::write(&transcript, "Hello world.\n\nThis is block two.").unwrap();

    scribe(&home)
        .args(["subtitles", "talk.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1\n00:00:00,000 --> "))
        .stdout(predicate::str::contains("2\n"))
        .stdout(predicate::str::contains("This is block two."));
}

#[test]
fn test_subtitles_writes_vtt_file() {
    let home = TempDir::new().unwrap();
    fs_err::write(home.path().join("talk.txt"), "Hello world.").unwrap();

    scribe(&home)
        .args(["subtitles", "talk.txt", "--format", "vtt", "--output", "out/talk.vtt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subtitles saved to"));

    let written = fs_err::read_to_string(home.path().join("out/talk.vtt")).unwrap();
    assert!(written.starts_with("WEBVTT\n\n00:00:00.000 --> 00:00:00.800"));
}

#[test]
fn test_subtitles_missing_file_fails() {
    let home = TempDir::new().unwrap();

    scribe(&home)
        .args(["subtitles", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read transcript file"));
}

#[test]
fn test_languages_lists_default() {
    let home = TempDir::new().unwrap();

    scribe(&home)
        .arg("languages")
        .assert()
        .success()
        .stdout(predicate::str::contains("English (default)"))
        .stdout(predicate::str::contains("Mandarin Chinese"));
}

#[test]
fn test_history_requires_user() {
    let home = TempDir::new().unwrap();

    scribe(&home)
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in with --user"));
}

#[test]
fn test_batch_needs_a_selection() {
    let home = TempDir::new().unwrap();

    scribe(&home).args(["batch", "lofi beats"]).assert().failure();
}
