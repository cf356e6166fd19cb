use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::output::ExportFormat;

/// One entry of the export history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub id: String,
    pub item_id: String,
    pub item_title: String,
    pub playlist_label: String,
    pub format: ExportFormat,
    pub file_name: String,
    pub exported_at: DateTime<Utc>,
}

/// An export about to be recorded; id and timestamp are assigned by the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExport {
    pub item_id: String,
    pub item_title: String,
    pub playlist_label: String,
    pub format: ExportFormat,
    pub file_name: String,
}

/// Export log, newest first, holding at most one record per (item, format)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportHistory {
    records: Vec<ExportRecord>,
}

impl ExportHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an export, replacing any earlier export of the same item and format
    pub fn record(&mut self, export: NewExport) -> ExportRecord {
        let record = ExportRecord {
            id: Uuid::new_v4().to_string(),
            item_id: export.item_id,
            item_title: export.item_title,
            playlist_label: export.playlist_label,
            format: export.format,
            file_name: export.file_name,
            exported_at: Utc::now(),
        };

        self.records
            .retain(|r| !(r.item_id == record.item_id && r.format == record.format));
        self.records.insert(0, record.clone());
        record
    }

    /// Refresh a record's timestamp and move it to the front, keeping its id
    pub fn touch(&mut self, id: &str) -> Option<ExportRecord> {
        let position = self.records.iter().position(|r| r.id == id)?;
        let mut record = self.records.remove(position);
        record.exported_at = Utc::now();
        self.records.insert(0, record.clone());
        Some(record)
    }

    pub fn get(&self, id: &str) -> Option<&ExportRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records per playlist label, ordered by label
    pub fn groups(&self) -> BTreeMap<String, usize> {
        let mut groups = BTreeMap::new();
        for record in &self.records {
            *groups.entry(record.playlist_label.clone()).or_insert(0) += 1;
        }
        groups
    }

    /// Records for one playlist label, or all of them when no label is given
    pub fn filtered(&self, playlist_label: Option<&str>) -> Vec<&ExportRecord> {
        self.records
            .iter()
            .filter(|r| playlist_label.map_or(true, |label| r.playlist_label == label))
            .collect()
    }
}
