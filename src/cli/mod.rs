use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::ExportFormat;

#[derive(Parser)]
#[command(
    name = "playlist-scribe",
    about = "Playlist Scribe - Fetch YouTube playlists and generate transcripts, summaries and subtitles",
    version,
    long_about = "A CLI tool that resolves a YouTube playlist URL or a topic to its videos, generates transcripts with an AI model and exports them as plain text, SRT or WebVTT subtitles."
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

    /// Sign in as this user to keep export history and edited transcripts
    #[arg(short, long, global = true, env = "PLAYLIST_SCRIBE_USER", value_name = "NAME")]
    pub user: Option<String>,

    /// Use the built-in sample generator instead of calling an AI model
    #[arg(long, global = true)]
    pub offline: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a playlist URL or topic and list its videos
    Fetch {
        /// Playlist URL or a topic to search for
        #[arg(value_name = "URL_OR_TOPIC")]
        input: String,
    },

    /// Generate the transcript of one video and export it
    Transcript {
        /// Playlist URL or a topic to search for
        #[arg(value_name = "URL_OR_TOPIC")]
        input: String,

        /// Id of the video to transcribe
        #[arg(short, long, value_name = "ID")]
        item: String,

        /// Transcript language (defaults to the configured language)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Export format
        #[arg(short, long, value_enum, default_value = "txt")]
        format: ExportFormat,

        /// Also summarize the transcript
        #[arg(long)]
        summary: bool,

        /// Also extract key topics
        #[arg(long)]
        topics: bool,

        /// Save the contents of this file as your edited transcript before exporting
        #[arg(long, value_name = "FILE")]
        edit: Option<PathBuf>,
    },

    /// Generate transcripts for several videos and bundle them in a zip
    Batch {
        /// Playlist URL or a topic to search for
        #[arg(value_name = "URL_OR_TOPIC")]
        input: String,

        /// Ids of the videos to include
        #[arg(long, value_name = "ID", num_args = 1.., required_unless_present = "all")]
        items: Vec<String>,

        /// Include every video of the playlist
        #[arg(long, conflicts_with = "items")]
        all: bool,

        /// Transcript language (defaults to the configured language)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,
    },

    /// Show past exports grouped by playlist
    History {
        /// Only show exports from this playlist
        #[arg(short, long, value_name = "LABEL")]
        playlist: Option<String>,
    },

    /// Produce a past export again from a freshly generated transcript
    Redownload {
        /// Id of the history record
        #[arg(value_name = "RECORD_ID")]
        record_id: String,

        /// Playlist URL or topic the export came from
        #[arg(value_name = "URL_OR_TOPIC")]
        input: String,
    },

    /// Turn a plain text transcript into subtitles
    Subtitles {
        /// Transcript file with paragraphs separated by blank lines
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Subtitle format
        #[arg(short, long, value_enum, default_value = "srt")]
        format: SubtitleFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show or create the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported transcript languages
    Languages,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl SubtitleFormat {
    pub fn render(&self, transcript: &str) -> String {
        match self {
            SubtitleFormat::Srt => crate::output::to_srt(transcript),
            SubtitleFormat::Vtt => crate::output::to_vtt(transcript),
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::Vtt => write!(f, "vtt"),
        }
    }
}
