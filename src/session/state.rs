//! Per-item generation state.
//!
//! An open item moves through `AwaitingLanguage -> Pending -> Ready | Failed`. The
//! summary and key topics of a ready transcript each have their own
//! `Idle -> Pending -> Ready | Failed` machine. Closing the item drops all of it.

use crate::source::Item;

/// State of a result derived from a transcript
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Derived<T> {
    #[default]
    Idle,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Derived<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Derived::Pending)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Derived::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Derived::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Transcript state of the open item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptState {
    AwaitingLanguage,
    Pending { language: String },
    Ready { language: String, transcript: String },
    Failed { language: String, message: String },
}

impl TranscriptState {
    pub fn is_pending(&self) -> bool {
        matches!(self, TranscriptState::Pending { .. })
    }

    /// Language of the current or last attempt
    pub fn language(&self) -> Option<&str> {
        match self {
            TranscriptState::AwaitingLanguage => None,
            TranscriptState::Pending { language }
            | TranscriptState::Ready { language, .. }
            | TranscriptState::Failed { language, .. } => Some(language.as_str()),
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            TranscriptState::Ready { transcript, .. } => Some(transcript.as_str()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TranscriptState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// The item whose transcript is being worked on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenItem {
    pub(crate) item: Item,
    pub(crate) epoch: u64,
    pub(crate) transcript: TranscriptState,
    pub(crate) summary: Derived<String>,
    pub(crate) key_topics: Derived<Vec<String>>,
}

impl OpenItem {
    pub(crate) fn new(item: Item, epoch: u64) -> Self {
        Self {
            item,
            epoch,
            transcript: TranscriptState::AwaitingLanguage,
            summary: Derived::Idle,
            key_topics: Derived::Idle,
        }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn transcript(&self) -> &TranscriptState {
        &self.transcript
    }

    pub fn summary(&self) -> &Derived<String> {
        &self.summary
    }

    pub fn key_topics(&self) -> &Derived<Vec<String>> {
        &self.key_topics
    }

    /// Drop everything derived from the previous transcript
    pub(crate) fn reset_derived(&mut self, epoch: u64) {
        self.epoch = epoch;
        self.summary = Derived::Idle;
        self.key_topics = Derived::Idle;
    }
}

/// Handle for an in-flight transcript generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptTicket {
    pub(crate) epoch: u64,
    pub title: String,
    pub language: String,
}

/// Handle for an in-flight summary or key topic extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTicket {
    pub(crate) epoch: u64,
    pub transcript: String,
}
