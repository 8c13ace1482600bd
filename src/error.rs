use thiserror::Error;

/// Errores tipados que cruzan la frontera HTTP.
///
/// Los fallos por candidato individual (campos faltantes, títulos raros) se
/// descartan en silencio dentro del motor de matching y nunca llegan aquí.
#[derive(Debug, Error)]
pub enum MusicError {
    /// Query vacía o identificador mal formado.
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    /// La búsqueda funcionó pero ningún candidato pasó los filtros. El
    /// endpoint de búsqueda lo traduce a lista vacía de cara al cliente.
    #[error("ningún resultado elegible para: {0}")]
    NoEligibleResult(String),

    /// Cuota agotada en el proveedor de búsqueda (403/429).
    /// No se reintenta en esta capa salvo con una credencial alternativa.
    #[error("cuota del proveedor de búsqueda agotada")]
    ProviderQuotaExceeded,

    /// Error de red o timeout del proveedor; el caller puede reintentar.
    #[error("error transitorio del proveedor: {0}")]
    ProviderTransientError(String),

    /// El conversor externo falló o produjo un archivo vacío/inexistente.
    #[error("descarga/conversión fallida para {id}: {reason}")]
    DownloadConversionFailed { id: String, reason: String },

    /// Fallo de filesystem en listado/evicción. Best-effort: nunca aborta
    /// la lectura que lo disparó.
    #[error("error de I/O en caché: {0}")]
    CacheIOError(#[from] std::io::Error),
}

impl MusicError {
    pub fn transient(err: impl std::fmt::Display) -> Self {
        Self::ProviderTransientError(err.to_string())
    }

    pub fn download_failed(id: &str, reason: impl std::fmt::Display) -> Self {
        Self::DownloadConversionFailed {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}
