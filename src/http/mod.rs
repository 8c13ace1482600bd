//! Capa HTTP: enrutado fino sobre la frontera de servicio.
//!
//! Aquí no hay lógica de dominio: los handlers validan parámetros, llaman al
//! servicio o a los clientes pass-through y traducen los errores tipados a
//! códigos de estado.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::error::MusicError;
use crate::matching::SearchMode;
use crate::service::MusicService;
use crate::sources::NapsterClient;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MusicService>,
    pub napster: Arc<NapsterClient>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/youtube/search", get(youtube_search))
        .route("/api/youtube/audio/{video_id}", get(youtube_audio))
        .route("/api/search", get(napster_search))
        .route("/api/track/{track_id}", get(napster_track))
        .route("/api/track/{track_id}/stream", get(napster_stream))
        .route("/api/trending", get(napster_trending))
        .with_state(state)
}

impl IntoResponse for MusicError {
    fn into_response(self) -> Response {
        let status = match &self {
            MusicError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MusicError::NoEligibleResult(_) => StatusCode::NOT_FOUND,
            MusicError::ProviderQuotaExceeded => StatusCode::SERVICE_UNAVAILABLE,
            MusicError::ProviderTransientError(_) => StatusCode::GATEWAY_TIMEOUT,
            MusicError::DownloadConversionFailed { .. } => StatusCode::BAD_GATEWAY,
            MusicError::CacheIOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("❌ {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    mode: Option<String>,
}

/// Búsqueda de videos. Modo "song" devuelve una lista de 0 o 1 elementos
/// (el mejor match); "artist" y "genre" devuelven la lista filtrada. Sin
/// match elegible la respuesta es una lista vacía, no un error.
async fn youtube_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, MusicError> {
    let query = params.q.unwrap_or_default();
    let mode = params
        .mode
        .as_deref()
        .map(|m| {
            SearchMode::parse(m)
                .ok_or_else(|| MusicError::InvalidInput(format!("modo desconocido: {m}")))
        })
        .transpose()?
        .unwrap_or(SearchMode::Song);

    let results = match mode {
        SearchMode::Song => match state.service.best_match(&query).await {
            Ok(candidate) => vec![candidate],
            Err(MusicError::NoEligibleResult(_)) => Vec::new(),
            Err(e) => return Err(e),
        },
        _ => state.service.filtered_search(&query, mode).await?,
    };

    Ok(Json(json!({ "results": results })))
}

/// Sirve el mp3 de un video, descargándolo en el miss de caché.
async fn youtube_audio(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, MusicError> {
    let path = state.service.audio_path(&video_id).await?;

    let file = tokio::fs::File::open(&path).await?;
    let stream = ReaderStream::new(file);

    Ok((
        [(header::CONTENT_TYPE, "audio/mpeg")],
        Body::from_stream(stream),
    ))
}

async fn napster_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, MusicError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(MusicError::InvalidInput(
            "la query de búsqueda no puede estar vacía".to_string(),
        ));
    }

    let results = state.napster.search_all(&query).await?;
    Ok(Json(results))
}

async fn napster_track(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> Result<Response, MusicError> {
    match state.napster.get_track(&track_id).await? {
        Some(track) => Ok(Json(track).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Track not found" })),
        )
            .into_response()),
    }
}

async fn napster_stream(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> Result<Response, MusicError> {
    match state.napster.get_stream(&track_id).await? {
        Some(stream) => Ok(Json(stream).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No stream available" })),
        )
            .into_response()),
    }
}

async fn napster_trending(State(state): State<AppState>) -> Result<impl IntoResponse, MusicError> {
    let tracks = state.napster.top_tracks().await?;
    Ok(Json(json!({ "tracks": tracks })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AudioCache;
    use crate::fetch::MockAudioFetcher;
    use crate::matching::SearchCandidate;
    use crate::sources::SearchProvider;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct FixedProvider {
        results: Vec<SearchCandidate>,
    }

    #[async_trait]
    impl SearchProvider for FixedProvider {
        async fn search(
            &self,
            _query: &str,
            _mode: SearchMode,
        ) -> Result<Vec<SearchCandidate>, MusicError> {
            Ok(self.results.clone())
        }
    }

    fn state_with(results: Vec<SearchCandidate>) -> (AppState, TempDir) {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(MockAudioFetcher::new()),
        ));
        let service = Arc::new(MusicService::new(
            Arc::new(FixedProvider { results }),
            cache,
        ));
        let napster = Arc::new(
            NapsterClient::new("clave".to_string(), "http://localhost".to_string()).unwrap(),
        );
        (AppState { service, napster }, tmp)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_song_search_without_eligible_match_returns_empty_list() {
        let (state, _tmp) = state_with(vec![SearchCandidate {
            video_id: "x".to_string(),
            title: "Shape of You - Piano Cover".to_string(),
            channel: "PianoCovers".to_string(),
            thumbnail: None,
        }]);

        let params = SearchParams {
            q: Some("Shape of You".to_string()),
            mode: Some("song".to_string()),
        };
        let response = youtube_search(State(state), Query(params))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_song_search_returns_single_best_match() {
        let (state, _tmp) = state_with(vec![SearchCandidate {
            video_id: "good".to_string(),
            title: "Ed Sheeran - Shape of You (Official Music Video)".to_string(),
            channel: "Ed Sheeran".to_string(),
            thumbnail: None,
        }]);

        let params = SearchParams {
            q: Some("Shape of You".to_string()),
            mode: Some("song".to_string()),
        };
        let response = youtube_search(State(state), Query(params))
            .await
            .unwrap()
            .into_response();

        let body = body_json(response).await;
        assert_eq!(body["results"][0]["video_id"], "good");
    }

    #[tokio::test]
    async fn test_unknown_mode_is_bad_request() {
        let (state, _tmp) = state_with(Vec::new());

        let params = SearchParams {
            q: Some("adele".to_string()),
            mode: Some("playlist".to_string()),
        };
        let err = match youtube_search(State(state), Query(params)).await {
            Err(e) => e,
            Ok(_) => panic!("un modo desconocido debe rechazarse"),
        };

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
