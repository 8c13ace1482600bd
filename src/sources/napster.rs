use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::MusicError;

/// Cliente pass-through contra la API de metadata de streaming (Napster
/// v2.2). No hay ranking aquí: se relaya lo que responde el proveedor con
/// los campos que el frontend espera.
pub struct NapsterClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "artistName")]
    pub artist_name: Option<String>,
    #[serde(rename = "albumId")]
    pub album_id: Option<String>,
    #[serde(rename = "albumName")]
    pub album_name: Option<String>,
    #[serde(rename = "previewURL")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtistSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "artistName")]
    pub artist_name: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombinedSearch {
    pub tracks: Vec<TrackSummary>,
    pub artists: Vec<ArtistSummary>,
    pub albums: Vec<AlbumSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    #[serde(rename = "streamUrl")]
    pub stream_url: String,
    #[serde(rename = "previewURL")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerboseSearchResponse {
    search: Option<SearchBlock>,
}

#[derive(Debug, Deserialize)]
struct SearchBlock {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    tracks: Vec<Value>,
    #[serde(default)]
    artists: Vec<Value>,
    #[serde(default)]
    albums: Vec<Value>,
}

impl NapsterClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, MusicError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(MusicError::transient)?;

        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    async fn get_json(&self, path: &str, extra: &[(&str, &str)]) -> Result<Value, MusicError> {
        let url = format!("{}{}", self.base_url, path);
        let mut params = vec![("apikey", self.api_key.as_str())];
        params.extend_from_slice(extra);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(MusicError::transient)?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            warn!("🚫 Cuota de Napster agotada ({})", status);
            return Err(MusicError::ProviderQuotaExceeded);
        }
        if !status.is_success() {
            return Err(MusicError::transient(format!(
                "Napster API error: {status}"
            )));
        }

        response.json().await.map_err(MusicError::transient)
    }

    async fn search_type(&self, query: &str, kind: &str) -> Result<SearchData, MusicError> {
        let value = self
            .get_json(
                "/search/verbose",
                &[("query", query), ("type", kind), ("per_type_limit", "10")],
            )
            .await?;

        let parsed: VerboseSearchResponse =
            serde_json::from_value(value).map_err(MusicError::transient)?;

        Ok(parsed
            .search
            .and_then(|s| s.data)
            .unwrap_or(SearchData {
                tracks: Vec::new(),
                artists: Vec::new(),
                albums: Vec::new(),
            }))
    }

    /// Búsqueda combinada: tracks + artistas + álbumes, 10 por tipo.
    pub async fn search_all(&self, query: &str) -> Result<CombinedSearch, MusicError> {
        debug!("🔍 Búsqueda Napster: {}", query);

        let tracks = self.search_type(query, "track").await?.tracks;
        let artists = self.search_type(query, "artist").await?.artists;
        let albums = self.search_type(query, "album").await?.albums;

        let tracks = tracks
            .iter()
            .map(|t| TrackSummary {
                id: str_field(t, "id"),
                name: str_field(t, "name"),
                artist_name: str_field(t, "artistName"),
                album_id: str_field(t, "albumId"),
                album_name: str_field(t, "albumName"),
                preview_url: str_field(t, "previewURL"),
            })
            .collect();

        let artists = artists
            .iter()
            .map(|a| {
                let id = str_field(a, "id");
                ArtistSummary {
                    image_url: image_url("artists", id.as_deref()),
                    id,
                    name: str_field(a, "name"),
                }
            })
            .collect();

        let albums = albums
            .iter()
            .map(|a| {
                let id = str_field(a, "id");
                AlbumSummary {
                    image_url: image_url("albums", id.as_deref()),
                    id,
                    name: str_field(a, "name"),
                    artist_name: str_field(a, "artistName"),
                }
            })
            .collect();

        Ok(CombinedSearch {
            tracks,
            artists,
            albums,
        })
    }

    /// Metadata de un track concreto, tal cual la devuelve el proveedor.
    pub async fn get_track(&self, track_id: &str) -> Result<Option<Value>, MusicError> {
        let value = self.get_json(&format!("/tracks/{track_id}"), &[]).await?;

        Ok(value
            .get("tracks")
            .and_then(|t| t.as_array())
            .and_then(|t| t.first())
            .cloned())
    }

    /// URL de streaming de un track, con fallback al preview si el proveedor
    /// no ofrece stream completo.
    pub async fn get_stream(&self, track_id: &str) -> Result<Option<StreamInfo>, MusicError> {
        let Some(track) = self.get_track(track_id).await? else {
            return Ok(None);
        };
        let preview_url = str_field(&track, "previewURL");

        let streams = self
            .get_json(&format!("/tracks/{track_id}/streams"), &[])
            .await?;

        if let Some(url) = streams
            .get("streams")
            .and_then(|s| s.as_array())
            .and_then(|s| s.first())
            .and_then(|s| s.get("url"))
            .and_then(|u| u.as_str())
        {
            return Ok(Some(StreamInfo {
                stream_url: url.to_string(),
                preview_url,
            }));
        }

        if let Some(preview) = &preview_url {
            return Ok(Some(StreamInfo {
                stream_url: format!("https://listen.hs.llnwd.net/g3/prvw/4/{preview}"),
                preview_url: preview_url.clone(),
            }));
        }

        Ok(None)
    }

    /// Top de tracks del proveedor (endpoint "trending").
    pub async fn top_tracks(&self) -> Result<Vec<Value>, MusicError> {
        let value = self.get_json("/tracks/top", &[("limit", "10")]).await?;

        Ok(value
            .get("tracks")
            .and_then(|t| t.as_array())
            .cloned()
            .unwrap_or_default())
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn image_url(kind: &str, id: Option<&str>) -> String {
    format!(
        "https://api.napster.com/imageserver/v2/{kind}/{}/images/200x200.jpg",
        id.unwrap_or_default()
    )
}
