use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::session::ExportHistory;
use crate::Result;

/// Everything kept for one signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub export_history: ExportHistory,

    /// Item id to the user's edited transcript
    #[serde(default)]
    pub edited_transcripts: BTreeMap<String, String>,
}

/// Key-value storage for per-user data
pub trait UserStore: Send + Sync {
    /// Load a user's data; `None` when nothing was stored yet
    fn load(&self, user: &str) -> Result<Option<UserData>>;

    fn save(&self, user: &str, data: &UserData) -> Result<()>;
}

/// Stores each user's data as a JSON file in a directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// One file per user name; percent-encoding keeps distinct names apart
    fn path_for(&self, user: &str) -> PathBuf {
        self.dir
            .join(format!("userData_{}.json", urlencoding::encode(user)))
    }
}

impl UserStore for JsonFileStore {
    fn load(&self, user: &str) -> Result<Option<UserData>> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs_err::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, user: &str, data: &UserData) -> Result<()> {
        fs_err::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(data)?;
        fs_err::write(self.path_for(user), content)?;
        tracing::debug!("Saved data for user {}", user);
        Ok(())
    }
}

/// Store that keeps everything in memory for the lifetime of the process
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn load(&self, user: &str) -> Result<Option<UserData>> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(user).cloned())
    }

    fn save(&self, user: &str, data: &UserData) -> Result<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.insert(user.to_string(), data.clone());
        Ok(())
    }
}
