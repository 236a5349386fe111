//! YouTube Data API search client.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::config::endpoint;
use crate::error::{Error, Result};

const SERVICE: &str = "youtube";

/// The first video matching a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub channel_title: String,
}

impl Video {
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }
}

/// Search phrase used for a country's showcase video.
pub fn showcase_query(country_name: &str) -> String {
    format!("Scenic {}", country_name.trim())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchPayload {
    items: Vec<ItemPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemPayload {
    id: IdPayload,
    snippet: SnippetPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IdPayload {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SnippetPayload {
    title: String,
    channel_title: String,
    thumbnails: ThumbnailsPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailsPayload {
    high: Option<ThumbnailPayload>,
    medium: Option<ThumbnailPayload>,
    default: Option<ThumbnailPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThumbnailPayload {
    url: String,
}

impl SearchPayload {
    fn first_video(self) -> Option<Video> {
        self.items.into_iter().find_map(|item| {
            let video_id = item.id.video_id.filter(|id| !id.is_empty())?;
            let thumbs = item.snippet.thumbnails;
            let thumbnail = thumbs
                .high
                .or(thumbs.medium)
                .or(thumbs.default)
                .map(|t| t.url)
                .filter(|u| !u.is_empty());
            Some(Video {
                video_id,
                title: item.snippet.title,
                thumbnail,
                channel_title: item.snippet.channel_title,
            })
        })
    }
}

/// Client for `GET /search?part=snippet&q=&type=video&maxResults=1&key=`.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl YouTubeClient {
    pub fn new(http: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    /// First video for `query`; `Ok(None)` when the search is empty.
    pub async fn first_video(&self, query: &str) -> Result<Option<Video>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingApiKey { service: SERVICE })?;

        let url = endpoint(&self.base_url, &["search"])?;
        let response = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet"),
                ("q", query.trim()),
                ("type", "video"),
                ("maxResults", "1"),
                ("key", key),
            ])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let payload: SearchPayload = response.json().await?;
        Ok(payload.first_video())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_first_item() {
        let payload: SearchPayload = serde_json::from_str(
            r#"{
                "items": [{
                    "id": {"kind": "youtube#video", "videoId": "abc123"},
                    "snippet": {
                        "title": "Scenic France 4K",
                        "channelTitle": "Travel",
                        "thumbnails": {"default": {"url": "d.jpg"}, "high": {"url": "h.jpg"}}
                    }
                }]
            }"#,
        )
        .unwrap();
        let video = payload.first_video().unwrap();
        assert_eq!(video.video_id, "abc123");
        assert_eq!(video.thumbnail.as_deref(), Some("h.jpg"));
        assert_eq!(video.channel_title, "Travel");
        assert_eq!(video.embed_url(), "https://www.youtube.com/embed/abc123");
    }

    #[test]
    fn empty_search_is_none() {
        let payload: SearchPayload = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(payload.first_video().is_none());

        let payload: SearchPayload =
            serde_json::from_str(r#"{"items": [{"id": {"kind": "youtube#channel"}}]}"#).unwrap();
        assert!(payload.first_video().is_none());
    }

    #[test]
    fn showcase_query_trims_name() {
        assert_eq!(showcase_query(" Peru "), "Scenic Peru");
    }
}
