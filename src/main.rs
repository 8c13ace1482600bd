use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod cache;
mod config;
mod error;
mod fetch;
mod http;
mod matching;
mod service;
mod sources;

use crate::cache::AudioCache;
use crate::config::Config;
use crate::fetch::YtDlpFetcher;
use crate::http::AppState;
use crate::service::MusicService;
use crate::sources::{NapsterClient, RotatingSearchProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cadencia=debug".parse()?),
        )
        .init();

    info!("🎵 Iniciando cadencia v{}", env!("CARGO_PKG_VERSION"));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        YtDlpFetcher::verify_dependencies().await?;
        println!("OK");
        return Ok(());
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Verificar dependencias externas (el servidor arranca igual si faltan:
    // la búsqueda sigue funcionando sin descargas)
    if let Err(e) = YtDlpFetcher::verify_dependencies().await {
        tracing::warn!("⚠️ Conversor externo no disponible: {}", e);
    }

    // Proveedor de búsqueda con rotación de claves
    let provider = Arc::new(RotatingSearchProvider::from_keys(
        &config.youtube_api_keys,
        Duration::from_secs(config.search_timeout_secs),
    )?);

    // Caché de audio con su conversor
    let fetcher = Arc::new(YtDlpFetcher::new(Duration::from_secs(
        config.download_timeout_secs,
    )));
    let cache = Arc::new(AudioCache::new(
        config.cache_dir.clone(),
        config.cache_quota_bytes,
        fetcher,
    ));

    // Cliente pass-through de metadata
    let napster = Arc::new(NapsterClient::new(
        config.napster_api_key.clone(),
        config.napster_api_url.clone(),
    )?);

    let state = AppState {
        service: Arc::new(MusicService::new(provider, cache)),
        napster,
    };

    let app = http::router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Servidor escuchando en {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Error al registrar Ctrl+C: {}", e);
        return;
    }
    info!("⚠️ Señal de shutdown recibida, cerrando...");
}
