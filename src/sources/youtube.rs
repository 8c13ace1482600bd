use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::SearchProvider;
use crate::error::MusicError;
use crate::matching::{SearchCandidate, SearchMode};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

#[derive(Debug, Deserialize)]
struct YouTubeAPIResponse {
    #[serde(default)]
    items: Vec<YouTubeVideo>,
}

#[derive(Debug, Deserialize)]
struct YouTubeVideo {
    id: Option<VideoId>,
    snippet: Option<VideoSnippet>,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize, Clone)]
struct Thumbnail {
    url: String,
}

/// Cliente de búsqueda contra YouTube Data API v3, con una sola clave.
pub struct YouTubeSearchClient {
    api_key: String,
    client: reqwest::Client,
}

impl YouTubeSearchClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, MusicError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(MusicError::transient)?;

        Ok(Self { api_key, client })
    }

    /// Ajusta la query y el número de resultados según el modo, igual que
    /// hace el frontend original: las canciones piden "official audio", los
    /// artistas "official music video" y los géneros "best ... official
    /// songs".
    fn shape_query(query: &str, mode: SearchMode) -> (String, usize) {
        match mode {
            SearchMode::Song => (format!("{query} official audio"), 25),
            SearchMode::Artist => (format!("{query} official music video"), 30),
            SearchMode::Genre => (format!("best {query} official songs"), 35),
        }
    }

    pub async fn search_raw(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchCandidate>, MusicError> {
        let (search_query, max_results) = Self::shape_query(query, mode);

        debug!("🔍 Búsqueda YouTube API v3 [{}]: {}", mode.as_str(), search_query);

        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", &search_query),
                ("type", "video"),
                ("maxResults", &max_results.to_string()),
                ("videoCategoryId", "10"),
                (
                    "fields",
                    "items(id(videoId),snippet(title,channelTitle,thumbnails))",
                ),
                ("key", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("⏰ Error de red contra YouTube API: {}", e);
                MusicError::transient(e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            warn!("🚫 Cuota de YouTube API agotada ({})", status);
            return Err(MusicError::ProviderQuotaExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("❌ YouTube API error: {} - {}", status, error_text);
            return Err(MusicError::transient(format!(
                "YouTube API error: {status} - {error_text}"
            )));
        }

        let api_response: YouTubeAPIResponse =
            response.json().await.map_err(MusicError::transient)?;

        // Resultados con campos faltantes se descartan en silencio
        let candidates: Vec<SearchCandidate> = api_response
            .items
            .into_iter()
            .filter_map(|video| {
                let video_id = video.id?.video_id?;
                let snippet = video.snippet?;
                let title = snippet.title?;
                let channel = snippet.channel_title?;
                let thumbnails = snippet.thumbnails?;
                let thumbnail = thumbnails
                    .medium
                    .or(thumbnails.high)
                    .map(|t| t.url);

                Some(SearchCandidate {
                    video_id,
                    title,
                    channel,
                    thumbnail,
                })
            })
            .collect();

        debug!("✅ YouTube API v3: {} candidatos válidos", candidates.len());
        Ok(candidates)
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearchClient {
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchCandidate>, MusicError> {
        self.search_raw(query, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shape_query_per_mode() {
        assert_eq!(
            YouTubeSearchClient::shape_query("adele", SearchMode::Song),
            ("adele official audio".to_string(), 25)
        );
        assert_eq!(
            YouTubeSearchClient::shape_query("adele", SearchMode::Artist),
            ("adele official music video".to_string(), 30)
        );
        assert_eq!(
            YouTubeSearchClient::shape_query("jazz", SearchMode::Genre),
            ("best jazz official songs".to_string(), 35)
        );
    }

    #[test]
    fn test_malformed_items_dropped_on_parse() {
        // Items sin videoId o sin snippet no deben producir candidatos
        let body = r#"{
            "items": [
                {"id": {"videoId": "abc"},
                 "snippet": {"title": "T", "channelTitle": "C",
                             "thumbnails": {"medium": {"url": "u"}}}},
                {"id": {},
                 "snippet": {"title": "X", "channelTitle": "Y",
                             "thumbnails": {}}},
                {"id": {"videoId": "sin-snippet"}}
            ]
        }"#;

        let parsed: YouTubeAPIResponse = serde_json::from_str(body).unwrap();
        let candidates: Vec<SearchCandidate> = parsed
            .items
            .into_iter()
            .filter_map(|video| {
                let video_id = video.id?.video_id?;
                let snippet = video.snippet?;
                Some(SearchCandidate {
                    video_id,
                    title: snippet.title?,
                    channel: snippet.channel_title?,
                    thumbnail: None,
                })
            })
            .collect();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].video_id, "abc");
    }
}
