//! Motor de matching: convierte resultados crudos del proveedor de video en
//! una decisión — el mejor candidato para una canción, o una lista filtrada
//! para búsquedas por artista/género.
//!
//! Todo este módulo es puro: funciones sobre strings y listas inmutables,
//! sin I/O, para poder testearlo con fixtures literales.

pub mod score;
pub mod title;

use serde::{Deserialize, Serialize};

pub use score::{filter_results, is_official_channel, score_candidate, select_best_match};
pub use title::{clean_title, normalize, parse_title};

/// Un resultado crudo de la búsqueda de videos, antes de filtrar/puntuar.
/// Inmutable una vez recibido; vive lo que dura una búsqueda.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchCandidate {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: Option<String>,
}

/// Título descompuesto en canción + artista (si se pudo separar).
/// Derivado, nunca persistido.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTitle {
    pub song: String,
    pub artist: Option<String>,
}

/// Modo de búsqueda solicitado por el cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Song,
    Artist,
    Genre,
}

impl SearchMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "song" => Some(Self::Song),
            "artist" => Some(Self::Artist),
            "genre" => Some(Self::Genre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Artist => "artist",
            Self::Genre => "genre",
        }
    }
}
