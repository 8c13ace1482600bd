pub mod napster;
pub mod rotating;
pub mod youtube;

use async_trait::async_trait;

use crate::error::MusicError;
use crate::matching::{SearchCandidate, SearchMode};

pub use napster::NapsterClient;
pub use rotating::RotatingSearchProvider;
pub use youtube::YouTubeSearchClient;

/// Proveedor de búsqueda de videos.
///
/// Devuelve los resultados crudos en el orden del proveedor; el motor de
/// matching decide después. Los errores de cuota y los transitorios se
/// distinguen para que la capa superior pueda rotar credenciales o
/// reintentar.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<SearchCandidate>, MusicError>;
}
