mod mocks;

use mocks::generator::MockGenerator;
use mocks::source::{item, MockPlaylistSource};
use playlist_scribe::output::{caption_blocks, to_srt, to_vtt};
use playlist_scribe::session::{ExportHistory, NewExport};
use playlist_scribe::source::resolve_and_fetch_playlist;
use playlist_scribe::{ExportFormat, ItemStatus, MemoryStore, ScribeError, Session};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn build_session(source: MockPlaylistSource, generator: MockGenerator) -> Session {
    Session::new(
        Arc::new(source),
        Arc::new(generator),
        Arc::new(MemoryStore::new()),
    )
}

fn zip_entry_count(bytes: &[u8]) -> usize {
    zip::ZipArchive::new(Cursor::new(bytes.to_vec()))
        .unwrap()
        .len()
}

// ─── Playlist resolution ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_playlist_url_skips_search() {
    let source = MockPlaylistSource::new("Grid Course", vec![item("v1", "Intro")]);
    let searches = source.searches.clone();
    let fetched = source.fetched.clone();

    let playlist = resolve_and_fetch_playlist(&source, "https://youtube.com/playlist?list=PL123")
        .await
        .unwrap();

    assert_eq!(playlist.title, "Grid Course");
    assert!(searches.lock().unwrap().is_empty());
    assert_eq!(*fetched.lock().unwrap(), vec!["PL123".to_string()]);
}

#[tokio::test]
async fn test_topic_without_results_is_not_found() {
    let source = MockPlaylistSource::new("unused", vec![]).with_search_result(None);
    let searches = source.searches.clone();

    let err = resolve_and_fetch_playlist(&source, "lofi beats")
        .await
        .unwrap_err();

    assert!(matches!(err, ScribeError::PlaylistNotFound { .. }));
    assert_eq!(*searches.lock().unwrap(), vec!["lofi beats".to_string()]);
}

#[tokio::test]
async fn test_blank_input_makes_no_calls() {
    let source = MockPlaylistSource::new("Grid Course", vec![item("v1", "Intro")]);
    let searches = source.searches.clone();
    let fetched = source.fetched.clone();

    let err = resolve_and_fetch_playlist(&source, " \t ").await.unwrap_err();

    assert!(matches!(err, ScribeError::EmptyInput));
    assert!(searches.lock().unwrap().is_empty());
    assert!(fetched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_items_are_removed() {
    let source = MockPlaylistSource::new(
        "Mixed",
        vec![
            item("v1", "Intro"),
            item("v2", "Private video"),
            item("v3", "Deleted video"),
            item("v4", "Outro"),
        ],
    );

    let playlist = resolve_and_fetch_playlist(&source, "mixed").await.unwrap();
    let titles: Vec<&str> = playlist.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Intro", "Outro"]);
}

#[tokio::test]
async fn test_source_error_message_reaches_session_state() {
    let source = MockPlaylistSource::new("", vec![]);
    let mut session = build_session(source, MockGenerator::default());

    let state = session.fetch_playlist("https://www.youtube.com/playlist?list=PLgone").await;
    assert_eq!(state.error(), Some("Playlist not found"));
}

// ─── Subtitles ───────────────────────────────────────────────────────────────

#[test]
fn test_vtt_for_two_paragraphs() {
    let vtt = to_vtt("Hello world.\n\nThis is block two.");
    assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> "));
    assert_eq!(vtt.matches(" --> ").count(), 2);
}

#[test]
fn test_caption_blocks_are_spaced_by_pause() {
    let transcript = "One two three four five.\n\nSix seven.\n\nEight nine ten eleven.";
    let blocks = caption_blocks(transcript);
    assert_eq!(blocks[0].start, 0.0);
    for pair in blocks.windows(2) {
        assert!((pair[1].start - (pair[0].end + 0.5)).abs() < 1e-9);
    }
    assert_eq!(to_srt(transcript), to_srt(transcript));
}

// ─── History ─────────────────────────────────────────────────────────────────

#[test]
fn test_history_keeps_latest_export_per_item_and_format() {
    let mut history = ExportHistory::new();
    let export = |file_name: &str| NewExport {
        item_id: "v1".to_string(),
        item_title: "Intro".to_string(),
        playlist_label: "Grid Course".to_string(),
        format: ExportFormat::Srt,
        file_name: file_name.to_string(),
    };

    let first = history.record(export("first.srt"));
    let second = history.record(export("second.srt"));

    assert_eq!(history.len(), 1);
    let kept = &history.records()[0];
    assert_eq!(kept.file_name, "second.srt");
    assert!(kept.exported_at >= first.exported_at);
    assert_eq!(kept.id, second.id);
}

// ─── Batch ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_with_one_failure_bundles_the_rest() {
    let source = MockPlaylistSource::new(
        "Three Videos",
        vec![item("v1", "First"), item("v2", "Second"), item("v3", "Third")],
    );
    let generator = MockGenerator::failing_for(&["Second"]);
    let calls = generator.calls.clone();
    let mut session = build_session(source, generator);

    session.fetch_playlist("three videos").await;
    session.toggle_select_all();

    let outcome = session
        .run_selected_batch("German", &CancellationToken::new(), |_| {})
        .await;

    let run = session.batch().unwrap();
    assert_eq!(run.status("v1"), Some(ItemStatus::Success));
    assert_eq!(run.status("v2"), Some(ItemStatus::Error));
    assert_eq!(run.status("v3"), Some(ItemStatus::Success));
    assert_eq!(run.processed(), 3);

    let bundle = outcome.bundle.unwrap();
    assert_eq!(zip_entry_count(&bundle.bytes), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Second: "));

    let titles: Vec<String> = calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
    assert!(calls.lock().unwrap().iter().all(|(_, lang)| lang == "German"));
}

#[tokio::test]
async fn test_batch_ignores_items_outside_playlist() {
    let source = MockPlaylistSource::new("Two", vec![item("v1", "First"), item("v2", "Second")]);
    let mut session = build_session(source, MockGenerator::default());
    session.fetch_playlist("two").await;

    let ids: HashSet<String> = ["v2".to_string(), "elsewhere".to_string()].into();
    let outcome = session
        .run_batch(&ids, "English", &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(session.batch().unwrap().target_ids(), ["v2".to_string()]);
    assert_eq!(session.history().len(), 1);
}

// ─── Open item ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_transcript_summary_and_export() {
    let source = MockPlaylistSource::new("Grid Course", vec![item("v1", "Intro")]);
    let mut session = build_session(source, MockGenerator::default());
    session.fetch_playlist("grid").await;

    assert!(session.open_item("v1"));
    assert!(session.generate_transcript("").await);
    assert!(session.generate_summary().await);
    assert!(session.extract_key_topics().await);

    let open = session.open().unwrap();
    assert_eq!(open.transcript().language(), Some("English"));
    assert_eq!(
        open.summary().value().map(String::as_str),
        Some("Welcome to Intro.")
    );
    assert_eq!(open.key_topics().value().map(Vec::len), Some(2));

    let artifact = session.export_open_item(ExportFormat::BundleAll).unwrap();
    assert_eq!(artifact.file_name, "transcript_intro.zip");
    assert_eq!(zip_entry_count(&artifact.bytes), 3);
    assert_eq!(session.history_groups().get("Grid Course"), Some(&1));
}
