//! Caché local de audio con evicción por cuota.
//!
//! Mapea un identificador de contenido a un mp3 local, descargando y
//! convirtiendo en el miss vía el conversor externo. La cuota total se
//! aplica con evicción por acceso más antiguo justo antes de cada descarga;
//! no hay tarea de evicción en background.
//!
//! Las descargas concurrentes del mismo id comparten una sola bajada
//! (single-flight): cada id tiene su mutex y el segundo caller observa el
//! hit recién escrito.

pub mod index;

use dashmap::DashMap;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::MusicError;
use crate::fetch::AudioFetcher;
pub use index::{CacheEntry, CacheIndex};

/// Extensiones intermedias que puede dejar una descarga interrumpida.
const TEMP_EXTENSIONS: &[&str] = &["part", "mp3", "webm", "m4a"];

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap())
}

pub struct AudioCache {
    index: Arc<CacheIndex>,
    quota: u64,
    fetcher: Arc<dyn AudioFetcher>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl AudioCache {
    pub fn new(dir: PathBuf, quota: u64, fetcher: Arc<dyn AudioFetcher>) -> Self {
        Self {
            index: Arc::new(CacheIndex::new(dir)),
            quota,
            fetcher,
            inflight: DashMap::new(),
        }
    }

    /// Ruta canónica del mp3 de un id.
    pub fn audio_path(&self, id: &str) -> PathBuf {
        self.index.dir().join(format!("{id}.mp3"))
    }

    /// Devuelve la ruta a un mp3 local reproducible para `id`.
    ///
    /// Hit: el archivo existe y no está vacío; se registra el acceso y se
    /// devuelve sin tocar red ni conversor. Miss: limpieza de restos
    /// parciales, pasada de evicción, descarga+conversión y verificación del
    /// resultado. Cualquier fallo borra lo parcial y propaga un error de
    /// descarga.
    pub async fn get_audio(&self, id: &str) -> Result<PathBuf, MusicError> {
        if !video_id_regex().is_match(id) {
            return Err(MusicError::InvalidInput(format!(
                "identificador de video inválido: {id}"
            )));
        }

        // Single-flight por id: descargas concurrentes del mismo contenido
        // esperan a la primera
        let lock = self
            .inflight
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.get_or_fetch(id).await
        };
        drop(lock);

        // Sin callers esperando, el mutex de este id ya no hace falta; el
        // mapa no debe crecer un mutex por cada id visto
        self.inflight
            .remove_if(id, |_, mutex| Arc::strong_count(mutex) == 1);

        result
    }

    async fn get_or_fetch(&self, id: &str) -> Result<PathBuf, MusicError> {
        let path = self.audio_path(id);

        if let Ok(metadata) = tokio::fs::metadata(&path).await {
            if metadata.len() > 0 {
                debug!("🎯 Hit de caché para {}", id);
                self.index.touch(id);
                return Ok(path);
            }
        }

        info!("📥 Miss de caché para {}, descargando", id);

        self.cleanup_temp_files(id).await;
        self.evict_if_over_quota().await;

        if let Err(e) = self.fetcher.fetch_and_convert(id, &path).await {
            self.cleanup_temp_files(id).await;
            return Err(e);
        }

        // El conversor puede "terminar bien" y aun así no dejar nada útil
        let valid = tokio::fs::metadata(&path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !valid {
            self.cleanup_temp_files(id).await;
            return Err(MusicError::download_failed(
                id,
                "el conversor no produjo un archivo de audio",
            ));
        }

        self.index.touch(id);
        Ok(path)
    }

    /// Pasada de evicción best-effort: un fallo de I/O aquí nunca tumba la
    /// lectura que la disparó. El recorrido del directorio es bloqueante, así
    /// que corre fuera del runtime.
    pub async fn evict_if_over_quota(&self) {
        let index = self.index.clone();
        let quota = self.quota;

        match tokio::task::spawn_blocking(move || index.evict_to(quota)).await {
            Ok(Ok(0)) => {}
            Ok(Ok(removed)) => info!("🧹 Evicción: {} archivos eliminados", removed),
            Ok(Err(e)) => warn!("⚠️ Error en la pasada de evicción: {}", e),
            Err(e) => warn!("⚠️ Pasada de evicción cancelada: {}", e),
        }
    }

    /// Borra restos de descargas anteriores de `id` para que el conversor no
    /// se confunda con estado parcial.
    pub async fn cleanup_temp_files(&self, id: &str) {
        for ext in TEMP_EXTENSIONS {
            let path = self.index.dir().join(format!("{id}.{ext}"));
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("🧹 Limpiado: {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("⚠️ No se pudo limpiar {}: {}", path.display(), e),
            }
        }
    }

    #[allow(dead_code)]
    pub fn index(&self) -> &CacheIndex {
        &self.index
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockAudioFetcher;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn fetcher_writing(bytes: usize, times: usize) -> MockAudioFetcher {
        let mut fetcher = MockAudioFetcher::new();
        fetcher
            .expect_fetch_and_convert()
            .times(times)
            .returning(move |_, target| {
                std::fs::write(target, vec![0u8; bytes]).unwrap();
                Ok(())
            });
        fetcher
    }

    #[tokio::test]
    async fn test_miss_invokes_downloader_once_with_canonical_path() {
        let tmp = TempDir::new().unwrap();
        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(fetcher_writing(10, 1)),
        );

        let path = cache.get_audio("abc123").await.unwrap();
        assert_eq!(path, tmp.path().join("abc123.mp3"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_hit_skips_downloader_and_returns_same_path() {
        let tmp = TempDir::new().unwrap();
        // times(1): la segunda llamada debe ser hit puro
        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(fetcher_writing(10, 1)),
        );

        let first = cache.get_audio("abc123").await.unwrap();
        let second = cache.get_audio("abc123").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_same_id_single_flight() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(fetcher_writing(10, 1)),
        ));

        let a = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_audio("mismo").await })
        };
        let b = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_audio("mismo").await })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(ra.unwrap(), rb.unwrap());
    }

    #[tokio::test]
    async fn test_inflight_locks_released_after_request() {
        let tmp = TempDir::new().unwrap();
        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(fetcher_writing(10, 2)),
        );

        cache.get_audio("uno").await.unwrap();
        cache.get_audio("dos").await.unwrap();
        cache.get_audio("uno").await.unwrap();

        // El mapa de descargas en vuelo no retiene un mutex por id visto
        assert_eq!(cache.inflight_len(), 0);
    }

    #[tokio::test]
    async fn test_fetcher_error_cleans_partials() {
        let tmp = TempDir::new().unwrap();
        let mut fetcher = MockAudioFetcher::new();
        fetcher
            .expect_fetch_and_convert()
            .times(1)
            .returning(|id, target| {
                // Simula una descarga interrumpida a mitad
                std::fs::write(target.with_extension("webm"), b"parcial").unwrap();
                Err(MusicError::download_failed(id, "conexión cortada"))
            });

        let cache = AudioCache::new(tmp.path().to_path_buf(), 1024, Arc::new(fetcher));

        let err = cache.get_audio("fallo1").await.unwrap_err();
        assert!(matches!(err, MusicError::DownloadConversionFailed { .. }));
        assert!(!tmp.path().join("fallo1.webm").exists());
        assert!(!tmp.path().join("fallo1.mp3").exists());
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let tmp = TempDir::new().unwrap();
        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(fetcher_writing(0, 1)),
        );

        let err = cache.get_audio("vacio1").await.unwrap_err();
        assert!(matches!(err, MusicError::DownloadConversionFailed { .. }));
        assert!(!tmp.path().join("vacio1.mp3").exists());
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let tmp = TempDir::new().unwrap();
        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(MockAudioFetcher::new()),
        );

        let err = cache.get_audio("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, MusicError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_eviction_runs_before_download() {
        let tmp = TempDir::new().unwrap();
        // Dos archivos antiguos de 400 bytes contra una cuota de 500
        std::fs::write(tmp.path().join("viejo1.mp3"), vec![0u8; 400]).unwrap();
        std::fs::write(tmp.path().join("viejo2.mp3"), vec![0u8; 400]).unwrap();

        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            500,
            Arc::new(fetcher_writing(100, 1)),
        );
        cache.index().touch("viejo1");
        cache.index().touch("viejo2");

        cache.get_audio("nuevo1").await.unwrap();

        assert!(!tmp.path().join("viejo1.mp3").exists());
        assert!(tmp.path().join("viejo2.mp3").exists());
        assert!(cache.index().total_size().unwrap() <= 500);
    }

    #[tokio::test]
    async fn test_cleanup_temp_files_removes_known_extensions() {
        let tmp = TempDir::new().unwrap();
        for ext in ["part", "webm", "m4a"] {
            std::fs::write(tmp.path().join(format!("sucio.{ext}")), b"x").unwrap();
        }

        let cache = AudioCache::new(
            tmp.path().to_path_buf(),
            1024,
            Arc::new(MockAudioFetcher::new()),
        );
        cache.cleanup_temp_files("sucio").await;

        for ext in ["part", "webm", "m4a"] {
            assert!(!tmp.path().join(format!("sucio.{ext}")).exists());
        }
    }
}
