use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Item, PlaylistSource};
use crate::{Result, ScribeError};

/// Thumbnail used when the API returns none for an item
pub const PLACEHOLDER_THUMBNAIL: &str = "https://picsum.photos/480/270";

/// Largest page size the playlistItems endpoint accepts
const PAGE_SIZE: usize = 50;

/// Playlist source backed by the YouTube Data API v3
pub struct YoutubeSource {
    client: Client,
    base_url: String,
    api_key: String,
    max_items: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    playlist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistsResponse {
    #[serde(default)]
    items: Vec<PlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItemEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemEntry {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: String,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    video_owner_channel_title: Option<String>,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl From<PlaylistItemSnippet> for Item {
    fn from(snippet: PlaylistItemSnippet) -> Self {
        let thumbnail_url = snippet
            .thumbnails
            .and_then(|t| t.medium.or(t.default))
            .map(|t| t.url)
            .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string());

        Item {
            id: snippet.resource_id.video_id,
            title: snippet.title,
            thumbnail_url,
            source_label: snippet
                .video_owner_channel_title
                .or(snippet.channel_title)
                .unwrap_or_default(),
        }
    }
}

impl YoutubeSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: "https://www.googleapis.com/youtube/v3".into(),
            api_key: api_key.into(),
            max_items: PAGE_SIZE,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items.max(1);
        self
    }

    /// GET an API resource and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut url = format!(
            "{}/{}?key={}",
            self.base_url,
            resource,
            urlencoding::encode(&self.api_key)
        );
        for (name, value) in query {
            url.push_str(&format!("&{}={}", name, urlencoding::encode(value)));
        }

        tracing::debug!("Requesting YouTube resource: {}", resource);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScribeError::SourceApi {
                status: status.as_u16(),
                message: api_error_message(&body, status.as_u16()),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Pull the upstream message out of an error body
fn api_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

#[async_trait]
impl PlaylistSource for YoutubeSource {
    async fn search_playlist(&self, query: &str) -> Result<Option<String>> {
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "playlist"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .find_map(|item| item.id.playlist_id))
    }

    async fn playlist_title(&self, locator: &str) -> Result<String> {
        let response: PlaylistsResponse = self
            .get_json("playlists", &[("part", "snippet"), ("id", locator)])
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(|entry| entry.snippet.title)
            .ok_or_else(|| ScribeError::PlaylistNotFound {
                input: locator.to_string(),
            })
    }

    async fn playlist_items(&self, locator: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let page_size = PAGE_SIZE.to_string();

        loop {
            let mut query = vec![
                ("part", "snippet"),
                ("playlistId", locator),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;
            items.extend(response.items.into_iter().map(|entry| Item::from(entry.snippet)));

            match response.next_page_token {
                Some(token) if items.len() < self.max_items => page_token = Some(token),
                _ => break,
            }
        }

        items.truncate(self.max_items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":403,"message":"API key not valid."}}"#;
        assert_eq!(api_error_message(body, 403), "API key not valid.");
        assert_eq!(api_error_message("<html>", 502), "HTTP error! status: 502");
    }

    #[test]
    fn test_item_from_snippet() {
        let json = r#"{
            "title": "Grid in 10 minutes",
            "channelTitle": "Playlist Owner",
            "videoOwnerChannelTitle": "Web Dev Simplified",
            "resourceId": {"kind": "youtube#video", "videoId": "abc123"},
            "thumbnails": {"default": {"url": "https://i.ytimg.com/vi/abc123/default.jpg"}}
        }"#;
        let snippet: PlaylistItemSnippet = serde_json::from_str(json).unwrap();
        let item = Item::from(snippet);

        assert_eq!(item.id, "abc123");
        assert_eq!(item.source_label, "Web Dev Simplified");
        assert_eq!(item.thumbnail_url, "https://i.ytimg.com/vi/abc123/default.jpg");
    }

    #[test]
    fn test_item_without_thumbnails_uses_placeholder() {
        let json = r#"{
            "title": "Deleted video",
            "channelTitle": "Owner",
            "resourceId": {"videoId": "gone"}
        }"#;
        let snippet: PlaylistItemSnippet = serde_json::from_str(json).unwrap();
        assert_eq!(Item::from(snippet).thumbnail_url, PLACEHOLDER_THUMBNAIL);
    }

    #[test]
    fn test_search_response_takes_first_playlist() {
        let json = r#"{"items":[{"id":{"kind":"youtube#playlist","playlistId":"PLfirst"}},{"id":{"playlistId":"PLsecond"}}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.items.into_iter().find_map(|i| i.id.playlist_id),
            Some("PLfirst".to_string())
        );
    }
}
