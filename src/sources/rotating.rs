use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{SearchProvider, YouTubeSearchClient};
use crate::error::MusicError;
use crate::matching::{SearchCandidate, SearchMode};

/// Proveedor de búsqueda con rotación de credenciales.
///
/// Mantiene un anillo ordenado de proveedores credenciados y avanza al
/// siguiente cuando el actual agota su cuota. Acotado al número de
/// credenciales: nada de reintentos recursivos. Los errores transitorios se
/// propagan sin rotar; esa credencial sigue siendo válida.
pub struct RotatingSearchProvider {
    clients: Vec<Arc<dyn SearchProvider>>,
    current: AtomicUsize,
}

impl std::fmt::Debug for RotatingSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingSearchProvider")
            .field("clients", &self.clients.len())
            .field("current", &self.current)
            .finish()
    }
}

impl RotatingSearchProvider {
    pub fn new(clients: Vec<Arc<dyn SearchProvider>>) -> Result<Self, MusicError> {
        if clients.is_empty() {
            return Err(MusicError::InvalidInput(
                "se necesita al menos una credencial".to_string(),
            ));
        }

        info!("🔑 Proveedor de búsqueda con {} credenciales", clients.len());

        Ok(Self {
            clients,
            current: AtomicUsize::new(0),
        })
    }

    /// Construye el anillo con un cliente de YouTube por clave de API.
    pub fn from_keys(api_keys: &[String], timeout: Duration) -> Result<Self, MusicError> {
        let clients = api_keys
            .iter()
            .map(|key| {
                YouTubeSearchClient::new(key.clone(), timeout)
                    .map(|client| Arc::new(client) as Arc<dyn SearchProvider>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(clients)
    }
}

#[async_trait]
impl SearchProvider for RotatingSearchProvider {
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchCandidate>, MusicError> {
        // Como mucho una pasada por el anillo de credenciales
        for attempt in 0..self.clients.len() {
            let index = self.current.load(Ordering::Relaxed) % self.clients.len();

            match self.clients[index].search(query, mode).await {
                Err(MusicError::ProviderQuotaExceeded) => {
                    warn!(
                        "🔄 Credencial {} sin cuota, cambiando a la siguiente ({}/{})",
                        index + 1,
                        attempt + 1,
                        self.clients.len()
                    );
                    self.current
                        .store((index + 1) % self.clients.len(), Ordering::Relaxed);
                }
                other => return other,
            }
        }

        warn!("🚫 Todas las credenciales han agotado su cuota");
        Err(MusicError::ProviderQuotaExceeded)
    }
}
