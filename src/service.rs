//! Frontera de servicio: las tres operaciones que la capa HTTP consume.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::AudioCache;
use crate::error::MusicError;
use crate::matching::{self, SearchCandidate, SearchMode};
use crate::sources::SearchProvider;

pub struct MusicService {
    provider: Arc<dyn SearchProvider>,
    cache: Arc<AudioCache>,
}

impl MusicService {
    pub fn new(provider: Arc<dyn SearchProvider>, cache: Arc<AudioCache>) -> Self {
        Self { provider, cache }
    }

    fn validate_query(query: &str) -> Result<(), MusicError> {
        if query.trim().is_empty() {
            return Err(MusicError::InvalidInput(
                "la query de búsqueda no puede estar vacía".to_string(),
            ));
        }
        Ok(())
    }

    /// Mejor match para una canción. Cuando la búsqueda funcionó pero nada
    /// pasó los filtros devuelve `NoEligibleResult`; la capa HTTP lo traduce
    /// a lista vacía de cara al cliente.
    pub async fn best_match(&self, query: &str) -> Result<SearchCandidate, MusicError> {
        Self::validate_query(query)?;

        let candidates = self.provider.search(query, SearchMode::Song).await?;
        debug!("🎯 {} candidatos crudos para '{}'", candidates.len(), query);

        match matching::select_best_match(query, &candidates) {
            Some(c) => {
                info!("✅ Mejor match para '{}': {} [{}]", query, c.title, c.video_id);
                Ok(c.clone())
            }
            None => {
                info!("🔍 Sin match elegible para '{}'", query);
                Err(MusicError::NoEligibleResult(query.to_string()))
            }
        }
    }

    /// Lista filtrada y deduplicada para los modos artista/género.
    pub async fn filtered_search(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchCandidate>, MusicError> {
        Self::validate_query(query)?;

        let candidates = self.provider.search(query, mode).await?;
        Ok(matching::filter_results(&candidates, mode))
    }

    /// Ruta local al audio de `id`; descarga en el miss.
    pub async fn audio_path(&self, id: &str) -> Result<PathBuf, MusicError> {
        self.cache.get_audio(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockAudioFetcher;
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

    fn service_with(results: Vec<SearchCandidate>) -> (MusicService, TempDir) {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(MockAudioFetcher::new()),
        ));
        (
            MusicService::new(Arc::new(FixedProvider { results }), cache),
            tmp,
        )
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid_input() {
        let (service, _tmp) = service_with(Vec::new());
        let err = service.best_match("   ").await.unwrap_err();
        assert!(matches!(err, MusicError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_no_eligible_match_is_typed_error() {
        let (service, _tmp) = service_with(vec![SearchCandidate {
            video_id: "x".to_string(),
            title: "Shape of You - Piano Cover".to_string(),
            channel: "PianoCovers".to_string(),
            thumbnail: None,
        }]);
        let err = service.best_match("Shape of You").await.unwrap_err();
        assert!(matches!(err, MusicError::NoEligibleResult(_)));
    }

    #[tokio::test]
    async fn test_best_match_end_to_end() {
        let (service, _tmp) = service_with(vec![
            SearchCandidate {
                video_id: "good".to_string(),
                title: "Ed Sheeran - Shape of You (Official Music Video)".to_string(),
                channel: "Ed Sheeran".to_string(),
                thumbnail: None,
            },
            SearchCandidate {
                video_id: "bad".to_string(),
                title: "Shape of You - Piano Cover".to_string(),
                channel: "PianoCovers".to_string(),
                thumbnail: None,
            },
        ]);
        let best = service.best_match("Shape of You").await.unwrap();
        assert_eq!(best.video_id, "good");
    }
}
