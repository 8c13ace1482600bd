use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cuota de caché por defecto: 500 MiB.
pub const DEFAULT_CACHE_QUOTA: u64 = 500 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Proveedores
    pub youtube_api_keys: Vec<String>,
    pub napster_api_key: String,
    pub napster_api_url: String,

    // Caché de audio
    pub cache_dir: PathBuf,
    pub cache_quota_bytes: u64,

    // Servidor
    pub http_port: u16,

    // Límites
    pub search_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Claves YOUTUBE_API_KEY_1..N, esquema multi-clave
            youtube_api_keys: Self::load_youtube_keys(),
            napster_api_key: std::env::var("NAPSTER_API_KEY")?,
            napster_api_url: std::env::var("NAPSTER_API_URL")
                .unwrap_or_else(|_| "https://api.napster.com/v2.2".to_string()),

            cache_dir: std::env::var("AUDIO_CACHE_DIR")
                .unwrap_or_else(|_| "audio_cache".to_string())
                .into(),
            cache_quota_bytes: std::env::var("CACHE_QUOTA_BYTES")
                .unwrap_or_else(|_| DEFAULT_CACHE_QUOTA.to_string())
                .parse()?,

            http_port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,

            search_timeout_secs: std::env::var("SEARCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
            download_timeout_secs: std::env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,
        };

        // Create directories if they don't exist
        std::fs::create_dir_all(&config.cache_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Carga todas las claves disponibles: primero `YOUTUBE_API_KEY`,
    /// después `YOUTUBE_API_KEY_1`, `YOUTUBE_API_KEY_2`, ... hasta el
    /// primer hueco.
    fn load_youtube_keys() -> Vec<String> {
        let mut keys = Vec::new();

        if let Ok(key) = std::env::var("YOUTUBE_API_KEY") {
            if !key.trim().is_empty() {
                keys.push(key);
            }
        }

        let mut i = 1;
        while let Ok(key) = std::env::var(format!("YOUTUBE_API_KEY_{i}")) {
            if key.trim().is_empty() {
                break;
            }
            keys.push(key);
            i += 1;
        }

        keys
    }

    pub fn validate(&self) -> Result<()> {
        if self.youtube_api_keys.is_empty() {
            anyhow::bail!(
                "No se encontraron claves de YouTube API (YOUTUBE_API_KEY o YOUTUBE_API_KEY_1..N)"
            );
        }

        if self.napster_api_key.trim().is_empty() {
            anyhow::bail!("NAPSTER_API_KEY no puede estar vacía");
        }

        if self.cache_quota_bytes == 0 {
            anyhow::bail!("La cuota de caché debe ser mayor que 0");
        }

        if self.search_timeout_secs == 0 || self.download_timeout_secs == 0 {
            anyhow::bail!("Los timeouts deben ser mayores que 0");
        }

        Ok(())
    }

    /// Resumen seguro para logs: nunca incluye las claves completas.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Proveedores: {} claves de YouTube, Napster en {}\n  \
            Caché: {} ({} MiB de cuota)\n  \
            HTTP: puerto {}\n  \
            Timeouts: búsqueda {}s, descarga {}s",
            self.youtube_api_keys.len(),
            self.napster_api_url,
            self.cache_dir.display(),
            self.cache_quota_bytes / (1024 * 1024),
            self.http_port,
            self.search_timeout_secs,
            self.download_timeout_secs,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_keys: Vec::new(),
            napster_api_key: String::new(),
            napster_api_url: "https://api.napster.com/v2.2".to_string(),
            cache_dir: "audio_cache".into(),
            cache_quota_bytes: DEFAULT_CACHE_QUOTA,
            http_port: 5000,
            search_timeout_secs: 10,
            download_timeout_secs: 120,
        }
    }
}
