use async_trait::async_trait;
use playlist_scribe::{Item, PlaylistSource, Result, ScribeError};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockPlaylistSource {
    pub search_result: Option<String>,
    pub title: String,
    pub items: Vec<Item>,
    pub searches: Arc<Mutex<Vec<String>>>,
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl MockPlaylistSource {
    pub fn new(title: &str, items: Vec<Item>) -> Self {
        Self {
            search_result: Some("PLsearched".to_string()),
            title: title.to_string(),
            items,
            ..Default::default()
        }
    }

    pub fn with_search_result(mut self, locator: Option<&str>) -> Self {
        self.search_result = locator.map(str::to_string);
        self
    }
}

pub fn item(id: &str, title: &str) -> Item {
    Item {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail_url: "https://picsum.photos/480/270".to_string(),
        source_label: "Test Channel".to_string(),
    }
}

#[async_trait]
impl PlaylistSource for MockPlaylistSource {
    async fn search_playlist(&self, query: &str) -> Result<Option<String>> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(self.search_result.clone())
    }

    async fn playlist_title(&self, locator: &str) -> Result<String> {
        self.fetched.lock().unwrap().push(locator.to_string());
        if self.title.is_empty() {
            return Err(ScribeError::SourceApi {
                status: 404,
                message: "Playlist not found".to_string(),
            });
        }
        Ok(self.title.clone())
    }

    async fn playlist_items(&self, _locator: &str) -> Result<Vec<Item>> {
        Ok(self.items.clone())
    }
}
