//! Limpieza y parseo de títulos de video.

use super::ParsedTitle;

/// Decoraciones que los canales añaden al título y que no aportan nada al
/// matching. Substrings exactos, disjuntos entre sí.
const DECORATIONS: &[&str] = &[
    "(Official Video)",
    "(Official Music Video)",
    "(Official Audio)",
    "[Official Video]",
    "[Official Music Video]",
    "[Official Audio]",
    "(Audio)",
    "[Audio]",
    "(Lyrics)",
    "[Lyrics]",
    "(Official Lyric Video)",
    "[Official Lyric Video]",
    "(Official Visualizer)",
    "[Official Visualizer]",
    "(Official)",
    "[Official]",
    "(HD)",
    "[HD]",
    "(HQ)",
    "[HQ]",
    "(4K)",
    "[4K]",
];

/// Separadores habituales "Artista - Canción", en orden de prioridad.
const SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | ", " // ", " ~ "];

/// Quita las decoraciones conocidas del título y recorta espacios.
/// Idempotente: limpiar dos veces da el mismo resultado.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.to_string();
    for decoration in DECORATIONS {
        cleaned = cleaned.replace(decoration, "");
    }
    cleaned.trim().to_string()
}

/// Normaliza a minúsculas dejando solo alfanuméricos y espacios.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Intenta separar el título en canción + artista.
///
/// Prueba los separadores en orden y se queda con el primero presente. El
/// lado que contiene el nombre del canal (case-insensitive) se toma como
/// artista; si ninguno lo contiene, se asume la convención "artista -
/// canción". Sin separador, intenta recortar el canal del título; si
/// tampoco está, devuelve el título crudo como canción sin artista.
pub fn parse_title(title: &str, channel: &str) -> ParsedTitle {
    let channel_lower = channel.to_lowercase();

    for separator in SEPARATORS {
        if let Some((left, right)) = title.split_once(separator) {
            let left = left.trim();
            let right = right.trim();

            if left.to_lowercase().contains(&channel_lower) {
                return ParsedTitle {
                    song: right.to_string(),
                    artist: Some(left.to_string()),
                };
            }
            if right.to_lowercase().contains(&channel_lower) {
                return ParsedTitle {
                    song: left.to_string(),
                    artist: Some(right.to_string()),
                };
            }
            // Convención por defecto: "Artista - Canción"
            return ParsedTitle {
                song: right.to_string(),
                artist: Some(left.to_string()),
            };
        }
    }

    if title.to_lowercase().contains(&channel_lower) {
        return ParsedTitle {
            song: title.replace(channel, "").trim().to_string(),
            artist: Some(channel.to_string()),
        };
    }

    ParsedTitle {
        song: title.to_string(),
        artist: None,
    }
}
