use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use crate::error::MusicError;

/// Una entrada del caché: un mp3 completo en disco.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: String,
    pub path: PathBuf,
    pub size: u64,
    pub accessed: SystemTime,
}

/// Índice del directorio de caché.
///
/// El directorio es la única fuente de verdad: no se persiste ningún índice
/// aparte, las entradas se descubren listando. Los atimes del filesystem no
/// son fiables con `relatime`, así que los accesos se registran además en un
/// overlay en memoria que tiene prioridad sobre la metadata.
pub struct CacheIndex {
    dir: PathBuf,
    atimes: DashMap<String, SystemTime>,
}

impl CacheIndex {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            atimes: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Registra un acceso a la entrada `id`.
    pub fn touch(&self, id: &str) {
        self.atimes.insert(id.to_string(), SystemTime::now());
    }

    /// Lista los mp3 no vacíos del directorio con tamaño y último acceso.
    pub fn list_entries(&self) -> Result<Vec<CacheEntry>, MusicError> {
        let mut entries = Vec::new();

        for dir_entry in std::fs::read_dir(&self.dir)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("mp3") {
                continue;
            }

            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = id.to_string();

            let metadata = dir_entry.metadata()?;
            if metadata.len() == 0 {
                continue;
            }

            let accessed = self
                .atimes
                .get(&id)
                .map(|a| *a)
                .or_else(|| metadata.accessed().ok())
                .or_else(|| metadata.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            entries.push(CacheEntry {
                id,
                path,
                size: metadata.len(),
                accessed,
            });
        }

        Ok(entries)
    }

    pub fn total_size(&self) -> Result<u64, MusicError> {
        Ok(self.list_entries()?.iter().map(|e| e.size).sum())
    }

    /// Evicción por cuota: borra las entradas menos recientemente accedidas
    /// hasta que el total quede en o por debajo de `quota`.
    ///
    /// Los errores de borrado por archivo se loguean y se saltan; nunca
    /// abortan la pasada. Devuelve cuántas entradas se eliminaron.
    pub fn evict_to(&self, quota: u64) -> Result<usize, MusicError> {
        let mut entries = self.list_entries()?;
        let mut total: u64 = entries.iter().map(|e| e.size).sum();

        if total <= quota {
            return Ok(0);
        }

        // Más antiguo primero
        entries.sort_by_key(|e| e.accessed);

        let mut removed = 0;
        for entry in entries {
            if total <= quota {
                break;
            }

            match std::fs::remove_file(&entry.path) {
                Ok(()) => {
                    total = total.saturating_sub(entry.size);
                    self.atimes.remove(&entry.id);
                    removed += 1;
                    debug!("🧹 Evicción de caché: {} ({} bytes)", entry.id, entry.size);
                }
                Err(e) => {
                    warn!("⚠️ No se pudo borrar {}: {}", entry.path.display(), e);
                }
            }
        }

        Ok(removed)
    }
}
