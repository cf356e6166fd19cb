use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::utils::safe_file_stem;
use crate::Result;

pub mod formatters;

pub use formatters::*;

/// Export formats offered for a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Plain text
    #[serde(rename = "txt")]
    #[value(name = "txt")]
    PlainText,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
    /// Zip bundle with the text, SRT and WebVTT files
    #[serde(rename = "all")]
    #[value(name = "all")]
    BundleAll,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::PlainText => "txt",
            ExportFormat::Srt => "srt",
            ExportFormat::Vtt => "vtt",
            ExportFormat::BundleAll => "zip",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::PlainText => write!(f, "txt"),
            ExportFormat::Srt => write!(f, "srt"),
            ExportFormat::Vtt => write!(f, "vtt"),
            ExportFormat::BundleAll => write!(f, "all"),
        }
    }
}

/// A rendered file ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Save the artifact into a directory, returning the written path
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs_err::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs_err::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// File name used for a single item export
pub fn export_file_name(item_title: &str, format: ExportFormat) -> String {
    format!("transcript_{}.{}", safe_file_stem(item_title), format.extension())
}

/// Render a transcript in the requested format
pub fn render_export(
    item_title: &str,
    transcript: &str,
    format: ExportFormat,
    file_name: &str,
) -> Result<ExportArtifact> {
    let bytes = match format {
        ExportFormat::PlainText => transcript.as_bytes().to_vec(),
        ExportFormat::Srt => to_srt(transcript).into_bytes(),
        ExportFormat::Vtt => to_vtt(transcript).into_bytes(),
        ExportFormat::BundleAll => {
            let mut bundle = Bundle::new();
            bundle.add(export_file_name(item_title, ExportFormat::PlainText), transcript);
            bundle.add(export_file_name(item_title, ExportFormat::Srt), to_srt(transcript));
            bundle.add(export_file_name(item_title, ExportFormat::Vtt), to_vtt(transcript));
            bundle.into_zip()?
        }
    };

    Ok(ExportArtifact {
        file_name: file_name.to_string(),
        bytes,
    })
}

/// In-memory collection of files that is packed into a single zip archive
#[derive(Debug, Default)]
pub struct Bundle {
    entries: Vec<(String, String)>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return its name in the bundle; a name already taken gets a numeric suffix
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> String {
        let mut name = name.into();
        if self.contains(&name) {
            let (stem, ext) = match name.rsplit_once('.') {
                Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
                None => (name.clone(), String::new()),
            };
            let mut n = 2;
            while self.contains(&format!("{}_{}{}", stem, n, ext)) {
                n += 1;
            }
            name = format!("{}_{}{}", stem, n, ext);
        }
        self.entries.push((name.clone(), content.into()));
        name
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_zip(self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content.as_bytes())?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
