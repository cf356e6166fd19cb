use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

pub mod youtube;

pub use youtube::YoutubeSource;

use crate::{Result, ScribeError};

/// Titles the data source uses for entries whose content is gone
pub const UNAVAILABLE_TITLES: &[&str] = &["Private video", "Deleted video"];

/// A single media item in a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque item id, unique within a playlist
    pub id: String,

    pub title: String,

    pub thumbnail_url: String,

    /// Channel or author name
    pub source_label: String,
}

/// A fully resolved playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistResult {
    pub title: String,
    pub items: Vec<Item>,
}

impl PlaylistResult {
    pub fn find(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == item_id)
    }
}

/// Trait for the playlist search and listing backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Search for a playlist by free text and return the top-ranked locator
    async fn search_playlist(&self, query: &str) -> Result<Option<String>>;

    /// Fetch the title of a playlist
    async fn playlist_title(&self, locator: &str) -> Result<String>;

    /// Fetch the ordered items of a playlist
    async fn playlist_items(&self, locator: &str) -> Result<Vec<Item>>;
}

/// How a user-entered playlist identifier should be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistInput {
    /// A playlist URL with a usable `list` parameter
    Locator(String),
    /// A YouTube URL without a usable `list` parameter
    MalformedUrl,
    /// Free text to search for
    Topic(String),
}

/// Decide whether the input is a playlist URL or a search topic
pub fn classify_input(input: &str) -> PlaylistInput {
    let input = input.trim();
    let topic = || PlaylistInput::Topic(input.to_string());

    if !input.chars().any(char::is_whitespace) {
        return classify_url(input).unwrap_or_else(topic);
    }

    // A playlist link inside surrounding text still counts as a link
    input
        .split_whitespace()
        .find_map(|token| match classify_url(token) {
            Some(PlaylistInput::Locator(locator)) => Some(PlaylistInput::Locator(locator)),
            _ => None,
        })
        .unwrap_or_else(topic)
}

/// Classify a single token; `None` when it is not a YouTube URL
fn classify_url(token: &str) -> Option<PlaylistInput> {
    let candidate = if token.starts_with("http://") || token.starts_with("https://") {
        token.to_string()
    } else {
        format!("https://{}", token)
    };

    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str().unwrap_or_default().to_lowercase();
    if host != "youtube.com" && !host.ends_with(".youtube.com") {
        return None;
    }

    let locator = url
        .query_pairs()
        .find(|(key, _)| key == "list")
        .map(|(_, value)| {
            value
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect::<String>()
        })
        .unwrap_or_default();

    if locator.is_empty() {
        Some(PlaylistInput::MalformedUrl)
    } else {
        Some(PlaylistInput::Locator(locator))
    }
}

/// Resolve user input to a playlist and fetch its details and items.
///
/// Blank input is rejected before any call to `source` is made. The title and the
/// item list are requested concurrently and both must succeed.
pub async fn resolve_and_fetch_playlist(
    source: &dyn PlaylistSource,
    input: &str,
) -> Result<PlaylistResult> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScribeError::EmptyInput);
    }

    let not_found = || ScribeError::PlaylistNotFound {
        input: input.to_string(),
    };

    let locator = match classify_input(input) {
        PlaylistInput::Locator(locator) => {
            tracing::debug!("Using playlist locator from URL: {}", locator);
            locator
        }
        PlaylistInput::MalformedUrl => {
            tracing::warn!("Playlist URL has no usable list parameter: {}", input);
            return Err(not_found());
        }
        PlaylistInput::Topic(topic) => {
            tracing::info!("Searching for a playlist about: {}", topic);
            source.search_playlist(&topic).await?.ok_or_else(not_found)?
        }
    };

    let (title, items) = tokio::try_join!(
        source.playlist_title(&locator),
        source.playlist_items(&locator)
    )?;

    let mut seen = HashSet::new();
    let items: Vec<Item> = items
        .into_iter()
        .filter(|item| !UNAVAILABLE_TITLES.contains(&item.title.as_str()))
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    if items.is_empty() {
        return Err(ScribeError::EmptyPlaylist { title });
    }

    tracing::info!("Fetched playlist \"{}\" with {} items", title, items.len());

    Ok(PlaylistResult { title, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn item(id: &str, title: &str) -> Item {
        Item {
            id: id.to_string(),
            title: title.to_string(),
            thumbnail_url: format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id),
            source_label: "Channel".to_string(),
        }
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(
            classify_input("https://youtube.com/playlist?list=PL123"),
            PlaylistInput::Locator("PL123".to_string())
        );
        assert_eq!(
            classify_input("www.youtube.com/playlist?list=PL_a-b9"),
            PlaylistInput::Locator("PL_a-b9".to_string())
        );
        assert_eq!(
            classify_input("https://m.youtube.com/watch?v=abc&list=PLxyz"),
            PlaylistInput::Locator("PLxyz".to_string())
        );
        assert_eq!(
            classify_input("https://youtube.com/playlist?foo=1"),
            PlaylistInput::MalformedUrl
        );
        assert_eq!(
            classify_input("lofi beats"),
            PlaylistInput::Topic("lofi beats".to_string())
        );
        assert_eq!(
            classify_input("https://vimeo.com/playlist?list=PL1"),
            PlaylistInput::Topic("https://vimeo.com/playlist?list=PL1".to_string())
        );
        assert_eq!(
            classify_input("https://notyoutube.com/playlist?list=PL1"),
            PlaylistInput::Topic("https://notyoutube.com/playlist?list=PL1".to_string())
        );
    }

    #[test]
    fn test_classify_input_music_host_and_embedded_link() {
        assert_eq!(
            classify_input("https://music.youtube.com/playlist?list=PLmusic"),
            PlaylistInput::Locator("PLmusic".to_string())
        );
        assert_eq!(
            classify_input("check this out https://www.youtube.com/playlist?list=PL42 thanks"),
            PlaylistInput::Locator("PL42".to_string())
        );
        assert_eq!(
            classify_input("youtube.com/watch?v=abc is great"),
            PlaylistInput::Topic("youtube.com/watch?v=abc is great".to_string())
        );
    }

    #[tokio::test]
    async fn test_music_url_skips_search() {
        let mut source = MockPlaylistSource::new();
        source.expect_search_playlist().never();
        source
            .expect_playlist_title()
            .with(eq("PLmusic"))
            .returning(|_| Ok("Music Mix".to_string()));
        source
            .expect_playlist_items()
            .with(eq("PLmusic"))
            .returning(|_| Ok(vec![item("s1", "Song")]));

        let playlist =
            resolve_and_fetch_playlist(&source, "https://music.youtube.com/playlist?list=PLmusic")
                .await
                .unwrap();
        assert_eq!(playlist.title, "Music Mix");
    }

    #[tokio::test]
    async fn test_blank_input_makes_no_calls() {
        let source = MockPlaylistSource::new();
        let err = resolve_and_fetch_playlist(&source, "   \t ").await.unwrap_err();
        assert!(matches!(err, ScribeError::EmptyInput));
    }

    #[tokio::test]
    async fn test_url_input_skips_search() {
        let mut source = MockPlaylistSource::new();
        source.expect_search_playlist().never();
        source
            .expect_playlist_title()
            .with(eq("PL123"))
            .times(1)
            .returning(|_| Ok("Lofi".to_string()));
        source
            .expect_playlist_items()
            .with(eq("PL123"))
            .times(1)
            .returning(|_| Ok(vec![item("a", "Track A")]));

        let result = resolve_and_fetch_playlist(&source, " https://youtube.com/playlist?list=PL123 ")
            .await
            .unwrap();
        assert_eq!(result.title, "Lofi");
        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn test_topic_without_results_is_not_found() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_search_playlist()
            .with(eq("lofi beats"))
            .times(1)
            .returning(|_| Ok(None));
        source.expect_playlist_title().never();
        source.expect_playlist_items().never();

        let err = resolve_and_fetch_playlist(&source, "lofi beats")
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::PlaylistNotFound { input } if input == "lofi beats"));
    }

    #[tokio::test]
    async fn test_malformed_url_is_not_found_without_search() {
        let mut source = MockPlaylistSource::new();
        source.expect_search_playlist().never();

        let err = resolve_and_fetch_playlist(&source, "https://www.youtube.com/playlist?list=")
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::PlaylistNotFound { .. }));
    }

    #[tokio::test]
    async fn test_sentinel_and_duplicate_items_are_dropped() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_search_playlist()
            .returning(|_| Ok(Some("PLfound".to_string())));
        source
            .expect_playlist_title()
            .returning(|_| Ok("Grid".to_string()));
        source.expect_playlist_items().returning(|_| {
            Ok(vec![
                item("a", "Intro"),
                item("b", "Private video"),
                item("c", "Deleted video"),
                item("a", "Intro again"),
                item("d", "Outro"),
            ])
        });

        let result = resolve_and_fetch_playlist(&source, "css grid").await.unwrap();
        let ids: Vec<_> = result.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(result.find("a").unwrap().title, "Intro");
    }

    #[tokio::test]
    async fn test_empty_playlist_names_resolved_title() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_playlist_title()
            .returning(|_| Ok("Secret Mix".to_string()));
        source
            .expect_playlist_items()
            .returning(|_| Ok(vec![item("x", "Private video")]));

        let err = resolve_and_fetch_playlist(&source, "youtube.com/playlist?list=PLsecret")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Secret Mix"));
    }

    #[tokio::test]
    async fn test_source_error_propagates_from_join() {
        let mut source = MockPlaylistSource::new();
        source
            .expect_playlist_title()
            .returning(|_| Ok("Fine".to_string()));
        source.expect_playlist_items().returning(|_| {
            Err(ScribeError::SourceApi {
                status: 404,
                message: "The playlist identified with the request's playlistId parameter cannot be found."
                    .to_string(),
            })
        });

        let err = resolve_and_fetch_playlist(&source, "https://youtube.com/playlist?list=PLgone")
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::SourceApi { status: 404, .. }));
    }
}
