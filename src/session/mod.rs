//! Playlist and transcript orchestration.
//!
//! A [`Session`] owns all application state: the signed-in user and their stored
//! data, the loaded playlist, the open item with its generation states, the batch
//! selection and the export history filter. Every operation catches its own
//! failures and leaves them in state, so callers read snapshots instead of
//! handling errors from the data sources directly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub mod batch;
pub mod history;
pub mod state;

pub use batch::{BatchOutcome, BatchRun, ItemStatus};
pub use history::{ExportHistory, ExportRecord, NewExport};
pub use state::{Derived, DerivedTicket, OpenItem, TranscriptState, TranscriptTicket};

use crate::generation::{self, TextGenerator, DEFAULT_LANGUAGE};
use crate::output::{self, Bundle, ExportArtifact, ExportFormat};
use crate::source::{self, Item, PlaylistResult, PlaylistSource};
use crate::store::{UserData, UserStore};
use crate::utils::safe_file_stem;
use crate::{Result, ScribeError};

/// How long batch results stay visible after a run finishes
pub const DEFAULT_BATCH_SETTLE: Duration = Duration::from_secs(5);

/// State of the playlist fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlaylistState {
    #[default]
    Empty,
    Loading { input: String },
    Loaded(PlaylistResult),
    Failed { input: String, message: String },
}

impl PlaylistState {
    pub fn playlist(&self) -> Option<&PlaylistResult> {
        match self {
            PlaylistState::Loaded(playlist) => Some(playlist),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PlaylistState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

fn settle<T>(result: Result<T>) -> Derived<T> {
    match result {
        Ok(value) => Derived::Ready(value),
        Err(e) => Derived::Failed(e.to_string()),
    }
}

/// Application state plus the collaborators it talks to
pub struct Session {
    source: Arc<dyn PlaylistSource>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn UserStore>,
    default_language: String,
    batch_settle: Duration,
    user: Option<String>,
    data: UserData,
    playlist: PlaylistState,
    open: Option<OpenItem>,
    next_epoch: u64,
    selection: HashSet<String>,
    batch: Option<BatchRun>,
    active_filter: Option<String>,
}

impl Session {
    pub fn new(
        source: Arc<dyn PlaylistSource>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            source,
            generator,
            store,
            default_language: DEFAULT_LANGUAGE.to_string(),
            batch_settle: DEFAULT_BATCH_SETTLE,
            user: None,
            data: UserData::default(),
            playlist: PlaylistState::Empty,
            open: None,
            next_epoch: 0,
            selection: HashSet::new(),
            batch: None,
            active_filter: None,
        }
    }

    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn with_batch_settle(mut self, settle: Duration) -> Self {
        self.batch_settle = settle;
        self
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    /// Sign in locally and load the user's stored data
    pub fn login(&mut self, username: &str) -> bool {
        let username = username.trim();
        if username.is_empty() {
            return false;
        }

        self.data = match self.store.load(username) {
            Ok(Some(data)) => data,
            Ok(None) => UserData::default(),
            Err(e) => {
                tracing::warn!(error = %e, user = username, "Failed to load user data, starting fresh");
                UserData::default()
            }
        };
        self.user = Some(username.to_string());
        self.reset_view();

        tracing::info!("Logged in as {}", username);
        true
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.data = UserData::default();
        self.reset_view();
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn reset_view(&mut self) {
        self.playlist = PlaylistState::Empty;
        self.open = None;
        self.selection.clear();
        self.batch = None;
        self.active_filter = None;
    }

    /// Write user data to the store; anonymous sessions keep it in memory only
    fn persist(&self) {
        if let Some(user) = &self.user {
            if let Err(e) = self.store.save(user, &self.data) {
                tracing::error!(error = %e, user = %user, "Failed to save user data");
            }
        }
    }

    // ─── Playlist ───────────────────────────────────────────────────────────

    /// Resolve the input to a playlist and load it
    pub async fn fetch_playlist(&mut self, input: &str) -> &PlaylistState {
        self.expire_batch();
        let input = input.trim().to_string();
        self.playlist = PlaylistState::Loading {
            input: input.clone(),
        };
        self.selection.clear();
        self.open = None;

        let source = Arc::clone(&self.source);
        self.playlist = match source::resolve_and_fetch_playlist(source.as_ref(), &input).await {
            Ok(playlist) => PlaylistState::Loaded(playlist),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch playlist");
                PlaylistState::Failed {
                    input,
                    message: e.to_string(),
                }
            }
        };

        &self.playlist
    }

    /// Repeat the last failed fetch with the same input
    pub async fn retry_fetch_playlist(&mut self) -> &PlaylistState {
        if let PlaylistState::Failed { input, .. } = &self.playlist {
            let input = input.clone();
            return self.fetch_playlist(&input).await;
        }
        &self.playlist
    }

    pub fn playlist_state(&self) -> &PlaylistState {
        &self.playlist
    }

    pub fn playlist(&self) -> Option<&PlaylistResult> {
        self.playlist.playlist()
    }

    fn playlist_label(&self) -> String {
        self.playlist()
            .map(|p| p.title.clone())
            .unwrap_or_default()
    }

    // ─── Open item ──────────────────────────────────────────────────────────

    fn bump_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }

    /// Open an item of the loaded playlist, discarding the previous one
    pub fn open_item(&mut self, item_id: &str) -> bool {
        let Some(item) = self.playlist().and_then(|p| p.find(item_id)).cloned() else {
            return false;
        };
        let epoch = self.bump_epoch();
        self.open = Some(OpenItem::new(item, epoch));
        true
    }

    pub fn close_item(&mut self) {
        self.open = None;
    }

    pub fn open(&self) -> Option<&OpenItem> {
        self.open.as_ref()
    }

    /// Open item, if it is still the one a ticket was issued for
    fn open_for(&mut self, epoch: u64) -> Option<&mut OpenItem> {
        let open = self.open.as_mut().filter(|open| open.epoch == epoch);
        if open.is_none() {
            tracing::debug!("Discarding result for a selection that is no longer open");
        }
        open
    }

    /// Transcript text of the open item, preferring the user's edit
    fn effective_transcript(&self) -> Option<String> {
        let open = self.open.as_ref()?;
        self.data
            .edited_transcripts
            .get(&open.item.id)
            .map(String::as_str)
            .or_else(|| open.transcript.transcript())
            .map(str::to_string)
    }

    /// Move the open item to `Pending`; `None` if nothing is open or a call is in flight
    pub fn begin_transcript(&mut self, language: &str) -> Option<TranscriptTicket> {
        if self.open.as_ref()?.transcript.is_pending() {
            return None;
        }

        let language = match language.trim() {
            "" => self.default_language.clone(),
            language => language.to_string(),
        };
        let epoch = self.bump_epoch();
        let open = self.open.as_mut()?;
        open.transcript = TranscriptState::Pending {
            language: language.clone(),
        };
        open.reset_derived(epoch);

        Some(TranscriptTicket {
            epoch,
            title: open.item.title.clone(),
            language,
        })
    }

    /// Start another attempt after a failure, with the language chosen before
    pub fn begin_retry(&mut self) -> Option<TranscriptTicket> {
        let language = match &self.open.as_ref()?.transcript {
            TranscriptState::Failed { language, .. } => language.clone(),
            _ => return None,
        };
        self.begin_transcript(&language)
    }

    pub fn complete_transcript(&mut self, ticket: &TranscriptTicket, result: Result<String>) -> bool {
        let Some(open) = self.open_for(ticket.epoch) else {
            return false;
        };
        if !open.transcript.is_pending() {
            return false;
        }

        let item_id = open.item.id.clone();
        let language = ticket.language.clone();
        let generated = result.is_ok();
        open.transcript = match result {
            Ok(transcript) => TranscriptState::Ready {
                language,
                transcript,
            },
            Err(e) => TranscriptState::Failed {
                language,
                message: e.to_string(),
            },
        };

        // A fresh transcript replaces the user's earlier edit
        if generated && self.data.edited_transcripts.remove(&item_id).is_some() {
            tracing::info!("Discarded edited transcript of {} after regeneration", item_id);
            self.persist();
        }
        true
    }

    async fn drive_transcript(&mut self, ticket: TranscriptTicket) -> bool {
        let generator = Arc::clone(&self.generator);
        let result =
            generation::generate_transcript(generator.as_ref(), &ticket.title, &ticket.language).await;
        self.complete_transcript(&ticket, result)
    }

    /// Generate a transcript for the open item
    pub async fn generate_transcript(&mut self, language: &str) -> bool {
        match self.begin_transcript(language) {
            Some(ticket) => self.drive_transcript(ticket).await,
            None => false,
        }
    }

    pub async fn retry_transcript(&mut self) -> bool {
        match self.begin_retry() {
            Some(ticket) => self.drive_transcript(ticket).await,
            None => false,
        }
    }

    pub fn begin_summary(&mut self) -> Option<DerivedTicket> {
        let transcript = self.effective_transcript()?;
        let open = self.open.as_mut()?;
        if open.summary.is_pending() {
            return None;
        }
        open.summary = Derived::Pending;
        Some(DerivedTicket {
            epoch: open.epoch,
            transcript,
        })
    }

    pub fn complete_summary(&mut self, ticket: &DerivedTicket, result: Result<String>) -> bool {
        match self.open_for(ticket.epoch) {
            Some(open) if open.summary.is_pending() => {
                open.summary = settle(result);
                true
            }
            _ => false,
        }
    }

    /// Summarize the open item's transcript
    pub async fn generate_summary(&mut self) -> bool {
        let Some(ticket) = self.begin_summary() else {
            return false;
        };
        let generator = Arc::clone(&self.generator);
        let result = generation::generate_summary(generator.as_ref(), &ticket.transcript).await;
        self.complete_summary(&ticket, result)
    }

    pub fn begin_key_topics(&mut self) -> Option<DerivedTicket> {
        let transcript = self.effective_transcript()?;
        let open = self.open.as_mut()?;
        if open.key_topics.is_pending() {
            return None;
        }
        open.key_topics = Derived::Pending;
        Some(DerivedTicket {
            epoch: open.epoch,
            transcript,
        })
    }

    pub fn complete_key_topics(
        &mut self,
        ticket: &DerivedTicket,
        result: Result<Vec<String>>,
    ) -> bool {
        match self.open_for(ticket.epoch) {
            Some(open) if open.key_topics.is_pending() => {
                open.key_topics = settle(result);
                true
            }
            _ => false,
        }
    }

    /// Extract key topics from the open item's transcript
    pub async fn extract_key_topics(&mut self) -> bool {
        let Some(ticket) = self.begin_key_topics() else {
            return false;
        };
        let generator = Arc::clone(&self.generator);
        let result = generation::extract_key_topics(generator.as_ref(), &ticket.transcript).await;
        self.complete_key_topics(&ticket, result)
    }

    // ─── Edits ──────────────────────────────────────────────────────────────

    /// Store an edited transcript; only signed-in users can keep edits
    pub fn save_edited_transcript(&mut self, item_id: &str, text: &str) -> bool {
        if self.user.is_none() {
            return false;
        }

        self.data
            .edited_transcripts
            .insert(item_id.to_string(), text.to_string());

        let edits_open_item = self
            .open
            .as_ref()
            .map_or(false, |open| open.item.id == item_id && !open.transcript.is_pending());
        if edits_open_item {
            let epoch = self.bump_epoch();
            if let Some(open) = self.open.as_mut() {
                open.reset_derived(epoch);
            }
        }

        self.persist();
        true
    }

    pub fn edited_transcript(&self, item_id: &str) -> Option<&str> {
        self.data.edited_transcripts.get(item_id).map(String::as_str)
    }

    // ─── Exports ────────────────────────────────────────────────────────────

    /// Add an export to the history and show that export's playlist
    pub fn record_export(&mut self, export: NewExport) -> ExportRecord {
        let record = self.data.export_history.record(export);
        self.active_filter = Some(record.playlist_label.clone());
        self.persist();

        tracing::info!(
            "Recorded {} export of \"{}\" as {}",
            record.format,
            record.item_title,
            record.file_name
        );
        record
    }

    /// Render the open item's transcript and record the export
    pub fn export_open_item(&mut self, format: ExportFormat) -> Result<ExportArtifact> {
        let transcript = self.effective_transcript().ok_or(ScribeError::NoTranscript)?;
        let item = self
            .open
            .as_ref()
            .map(|open| open.item.clone())
            .ok_or(ScribeError::NoTranscript)?;

        let file_name = output::export_file_name(&item.title, format);
        let artifact = output::render_export(&item.title, &transcript, format, &file_name)?;

        let playlist_label = self.playlist_label();
        self.record_export(NewExport {
            item_id: item.id,
            item_title: item.title,
            playlist_label,
            format,
            file_name,
        });

        Ok(artifact)
    }

    /// Produce a past export again from a freshly generated transcript
    pub async fn redownload_export(&mut self, record_id: &str) -> Result<ExportArtifact> {
        let record = self
            .data
            .export_history
            .get(record_id)
            .cloned()
            .ok_or_else(|| ScribeError::UnknownExport(record_id.to_string()))?;

        let playlist = self.playlist();
        let item = playlist.and_then(|p| p.find(&record.item_id));
        let same_playlist = playlist.map_or(false, |p| p.title == record.playlist_label);
        if item.is_none() && !same_playlist {
            return Err(ScribeError::StaleReference {
                playlist: record.playlist_label,
            });
        }
        let title = item.map_or_else(|| record.item_title.clone(), |item| item.title.clone());

        let generator = Arc::clone(&self.generator);
        let language = self.default_language.clone();
        let transcript = generation::generate_transcript(generator.as_ref(), &title, &language).await?;

        let artifact = output::render_export(
            &record.item_title,
            &transcript,
            record.format,
            &record.file_name,
        )?;

        self.data.export_history.touch(&record.id);
        self.persist();

        Ok(artifact)
    }

    pub fn history(&self) -> &ExportHistory {
        &self.data.export_history
    }

    /// History records under the active playlist filter
    pub fn filtered_history(&self) -> Vec<&ExportRecord> {
        self.data
            .export_history
            .filtered(self.active_filter.as_deref())
    }

    /// Playlist labels in the history with their export counts
    pub fn history_groups(&self) -> std::collections::BTreeMap<String, usize> {
        self.data.export_history.groups()
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.active_filter.as_deref()
    }

    pub fn set_active_filter(&mut self, playlist_label: Option<String>) {
        self.active_filter = playlist_label;
    }

    // ─── Batch ──────────────────────────────────────────────────────────────

    fn batch_in_progress(&self) -> bool {
        self.batch
            .as_ref()
            .map_or(false, |run| !run.is_settled(Instant::now()))
    }

    /// Drop a batch run whose settle delay has passed, along with its selection
    fn expire_batch(&mut self) {
        if self
            .batch
            .as_ref()
            .map_or(false, |run| run.is_settled(Instant::now()))
        {
            tracing::debug!("Clearing settled batch run");
            self.batch = None;
            self.selection.clear();
        }
    }

    /// The current or recently finished batch run
    pub fn batch(&self) -> Option<&BatchRun> {
        self.batch
            .as_ref()
            .filter(|run| !run.is_settled(Instant::now()))
    }

    /// Wait until the finished batch run settles, then clear it
    pub async fn wait_for_batch_settle(&mut self) {
        if let Some(at) = self.batch.as_ref().and_then(|run| run.settles_at) {
            tokio::time::sleep_until(at).await;
        }
        self.expire_batch();
    }

    fn selection_visible(&self) -> bool {
        !self
            .batch
            .as_ref()
            .map_or(false, |run| run.is_settled(Instant::now()))
    }

    pub fn is_selected(&self, item_id: &str) -> bool {
        self.selection_visible() && self.selection.contains(item_id)
    }

    pub fn selected_ids(&self) -> HashSet<String> {
        if self.selection_visible() {
            self.selection.clone()
        } else {
            HashSet::new()
        }
    }

    /// Add or remove an item from the batch selection
    pub fn toggle_selection(&mut self, item_id: &str) -> bool {
        self.expire_batch();
        if self.batch_in_progress() {
            return false;
        }
        if self.playlist().and_then(|p| p.find(item_id)).is_none() {
            return false;
        }

        if !self.selection.remove(item_id) {
            self.selection.insert(item_id.to_string());
        }
        true
    }

    /// Select every item, or clear the selection when everything is selected
    pub fn toggle_select_all(&mut self) {
        self.expire_batch();
        if self.batch_in_progress() {
            return;
        }
        let Some(playlist) = self.playlist() else {
            return;
        };

        let all: HashSet<String> = playlist.items.iter().map(|item| item.id.clone()).collect();
        self.selection = if self.selection == all {
            HashSet::new()
        } else {
            all
        };
    }

    /// Run a batch over the current selection
    pub async fn run_selected_batch<F>(
        &mut self,
        language: &str,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> BatchOutcome
    where
        F: FnMut(&BatchRun),
    {
        let ids = self.selected_ids();
        self.run_batch(&ids, language, cancel, on_progress).await
    }

    /// Generate transcripts for many items, one at a time.
    ///
    /// Items are processed in playlist order; ids that are not in the loaded
    /// playlist are ignored. Each success is recorded as a plain text export and
    /// added to a single zip bundle. Failures never stop the run: their messages
    /// are collected and returned together. Cancellation is checked between items.
    pub async fn run_batch<F>(
        &mut self,
        item_ids: &HashSet<String>,
        language: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> BatchOutcome
    where
        F: FnMut(&BatchRun),
    {
        self.expire_batch();
        if self.batch_in_progress() {
            tracing::warn!("A batch run is still settling, ignoring new request");
            return BatchOutcome {
                ignored: true,
                ..Default::default()
            };
        }

        let Some(playlist) = self.playlist().cloned() else {
            tracing::debug!("No playlist loaded, nothing to batch");
            return BatchOutcome::default();
        };
        let targets: Vec<Item> = playlist
            .items
            .iter()
            .filter(|item| item_ids.contains(&item.id))
            .cloned()
            .collect();
        if targets.is_empty() {
            tracing::debug!("No selected items in \"{}\", nothing to batch", playlist.title);
            return BatchOutcome::default();
        }

        let language = match language.trim() {
            "" => self.default_language.clone(),
            language => language.to_string(),
        };

        tracing::info!(
            "Starting batch of {} transcripts for \"{}\"",
            targets.len(),
            playlist.title
        );

        let mut run = BatchRun::new(targets.iter().map(|item| item.id.clone()).collect());
        let mut outcome = BatchOutcome::default();
        let mut bundle = Bundle::new();
        let generator = Arc::clone(&self.generator);
        on_progress(&run);

        for item in &targets {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                outcome.failed += 1;
                run.errors
                    .push(format!("{}: cancelled before generation", item.title));
                run.mark(&item.id, ItemStatus::Error);
                run.processed += 1;
                on_progress(&run);
                continue;
            }

            match generation::generate_transcript(generator.as_ref(), &item.title, &language).await {
                Ok(transcript) => {
                    let file_name = bundle.add(
                        output::export_file_name(&item.title, ExportFormat::PlainText),
                        transcript,
                    );
                    self.record_export(NewExport {
                        item_id: item.id.clone(),
                        item_title: item.title.clone(),
                        playlist_label: playlist.title.clone(),
                        format: ExportFormat::PlainText,
                        file_name,
                    });
                    run.mark(&item.id, ItemStatus::Success);
                    outcome.succeeded += 1;
                }
                Err(e) => {
                    run.errors.push(format!("{}: {}", item.title, e));
                    run.mark(&item.id, ItemStatus::Error);
                    outcome.failed += 1;
                }
            }

            run.processed += 1;
            on_progress(&run);
        }

        if !bundle.is_empty() {
            let stem = match safe_file_stem(&playlist.title) {
                stem if stem.is_empty() => "playlist".to_string(),
                stem => stem,
            };
            let file_name = format!(
                "transcripts_{}_{}.zip",
                stem,
                chrono::Utc::now().format("%Y-%m-%d")
            );
            match bundle.into_zip() {
                Ok(bytes) => outcome.bundle = Some(ExportArtifact { file_name, bytes }),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build batch archive");
                    run.errors.push(format!("Could not build the archive: {}", e));
                }
            }
        }

        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            outcome.succeeded,
            outcome.failed
        );

        outcome.errors = run.errors.clone();
        run.settles_at = Some(Instant::now() + self.batch_settle);
        self.batch = Some(run);
        outcome
    }
}
