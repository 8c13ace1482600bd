//! Descarga y conversión de audio vía yt-dlp + ffmpeg.
//!
//! El conversor es una caja negra: recibe un id y una ruta destino y o bien
//! deja un `.mp3` completo en esa ruta o falla. Sin reporte de progreso
//! parcial.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::MusicError;

/// Conversor externo de contenido a audio local.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Descarga el contenido `video_id` y deja un mp3 en `target`.
    async fn fetch_and_convert(&self, video_id: &str, target: &Path) -> Result<(), MusicError>;
}

/// Implementación real sobre el binario yt-dlp (que a su vez invoca ffmpeg
/// para extraer el audio).
pub struct YtDlpFetcher {
    timeout: Duration,
}

impl YtDlpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Verifica que yt-dlp y ffmpeg estén disponibles.
    pub async fn verify_dependencies() -> Result<(), MusicError> {
        let ytdlp_check = tokio::process::Command::new("yt-dlp")
            .arg("--version")
            .output()
            .await;

        match ytdlp_check {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!("✅ yt-dlp versión: {}", version.trim());
            }
            _ => {
                error!("❌ yt-dlp no encontrado. Instala con: pip install yt-dlp");
                return Err(MusicError::download_failed("-", "yt-dlp no disponible"));
            }
        }

        let ffmpeg_check = tokio::process::Command::new("ffmpeg")
            .arg("-version")
            .output()
            .await;

        match ffmpeg_check {
            Ok(output) if output.status.success() => {
                info!("✅ ffmpeg disponible");
            }
            _ => {
                error!("❌ ffmpeg no encontrado. Instala con: sudo apt install ffmpeg");
                return Err(MusicError::download_failed("-", "ffmpeg no disponible"));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    async fn fetch_and_convert(&self, video_id: &str, target: &Path) -> Result<(), MusicError> {
        // yt-dlp decide la extensión intermedia; el postprocesador deja el
        // mp3 final exactamente en `target`
        let template = target.with_extension("%(ext)s");
        let url = format!("https://www.youtube.com/watch?v={video_id}");

        info!("⬇️ Descargando audio para {}", video_id);

        let mut cmd = tokio::process::Command::new("yt-dlp");
        cmd.args([
            "-f",
            "bestaudio/best",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "-o",
        ])
        .arg(&template)
        .arg(&url);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                warn!("⏰ Timeout descargando {}", video_id);
                MusicError::download_failed(video_id, "timeout del conversor externo")
            })?
            .map_err(|e| MusicError::download_failed(video_id, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("❌ yt-dlp falló para {}: {}", video_id, stderr.trim());
            return Err(MusicError::download_failed(video_id, stderr.trim()));
        }

        info!("✅ Audio descargado y convertido para {}", video_id);
        Ok(())
    }
}
