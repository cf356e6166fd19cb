use std::collections::HashMap;
use tokio::time::Instant;

use crate::output::ExportArtifact;

/// Outcome of one item in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Success,
    Error,
}

/// Progress of a batch generation pass
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub(crate) target_ids: Vec<String>,
    pub(crate) processed: usize,
    pub(crate) statuses: HashMap<String, ItemStatus>,
    pub(crate) errors: Vec<String>,
    pub(crate) settles_at: Option<Instant>,
}

impl BatchRun {
    pub(crate) fn new(target_ids: Vec<String>) -> Self {
        let statuses = target_ids
            .iter()
            .map(|id| (id.clone(), ItemStatus::Pending))
            .collect();
        Self {
            target_ids,
            processed: 0,
            statuses,
            errors: Vec::new(),
            settles_at: None,
        }
    }

    pub fn target_ids(&self) -> &[String] {
        &self.target_ids
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.target_ids.len()
    }

    /// Status of an item; `None` for items outside this run
    pub fn status(&self, item_id: &str) -> Option<ItemStatus> {
        self.statuses.get(item_id).copied()
    }

    /// Errors collected so far, one line per failed item
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_finished(&self) -> bool {
        self.settles_at.is_some()
    }

    pub(crate) fn is_settled(&self, now: Instant) -> bool {
        self.settles_at.map_or(false, |at| now >= at)
    }

    pub(crate) fn mark(&mut self, item_id: &str, status: ItemStatus) {
        self.statuses.insert(item_id.to_string(), status);
    }
}

/// What a finished batch run produced
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// Zip of every generated transcript, absent when nothing succeeded
    pub bundle: Option<ExportArtifact>,
    pub errors: Vec<String>,
    pub cancelled: bool,
    /// The request was dropped because an earlier run has not settled yet
    pub ignored: bool,
}
