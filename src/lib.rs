//! Playlist Scribe - fetch YouTube playlists, generate transcripts and export them
//!
//! This library resolves a playlist URL or topic to a list of items, drives an AI
//! text generator to produce transcripts, summaries and key topics, and renders
//! transcripts as plain text, SRT or WebVTT subtitles.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod output;
pub mod session;
pub mod source;
pub mod store;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{Result, ScribeError};
pub use generation::{CannedGenerator, ChatCompletionGenerator, Provider, TextGenerator};
pub use output::{ExportArtifact, ExportFormat};
pub use session::{BatchOutcome, BatchRun, ItemStatus, PlaylistState, Session};
pub use source::{Item, PlaylistResult, PlaylistSource, YoutubeSource};
pub use store::{JsonFileStore, MemoryStore, UserData, UserStore};
