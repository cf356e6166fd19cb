use thiserror::Error;

/// Error types produced by the playlist and transcript core
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Please enter a YouTube playlist URL or a topic.")]
    EmptyInput,

    #[error("Could not find a playlist for \"{input}\".")]
    PlaylistNotFound { input: String },

    #[error("{message}")]
    SourceApi { status: u16, message: String },

    #[error("The playlist \"{title}\" appears to be empty or private.")]
    EmptyPlaylist { title: String },

    #[error("{message}")]
    Generation { message: String },

    #[error("Please fetch the \"{playlist}\" playlist again to re-download this transcript.")]
    StaleReference { playlist: String },

    #[error("Generate a transcript before exporting it.")]
    NoTranscript,

    #[error("No export with id {0} in history")]
    UnknownExport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl ScribeError {
    /// Wrap a generation failure in a message that is safe to show to a user.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

pub type Result<T, E = ScribeError> = std::result::Result<T, E>;
