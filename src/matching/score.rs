//! Puntuación y filtrado de candidatos.

use std::collections::HashSet;

use super::title::{clean_title, normalize, parse_title};
use super::{SearchCandidate, SearchMode};

/// Palabras que delatan versiones no originales. Un título que contenga
/// cualquiera queda excluido del scoring.
const SKIP_KEYWORDS: &[&str] = &[
    "cover",
    "karaoke",
    "instrumental",
    "remix",
    "live",
    "concert",
    "reaction",
    "review",
    "tutorial",
    "lesson",
    "how to",
    "behind the scenes",
    "acoustic",
    "piano version",
    "guitar version",
    "drum cover",
    "bass cover",
    "extended",
    "edit",
    "mix",
    "mashup",
    "medley",
    "tribute",
];

/// Keywords de canales de música oficiales conocidos.
const OFFICIAL_KEYWORDS: &[&str] = &[
    "official",
    "vevo",
    "records",
    "music",
    "entertainment",
    "label",
    "studio",
];

/// Heurística de canal oficial: allow-list de keywords más, si hay artista,
/// contención mutua de las formas normalizadas. No es una verificación de
/// identidad: se aceptan falsos positivos y negativos.
pub fn is_official_channel(channel: &str, artist: Option<&str>) -> bool {
    let channel_lower = channel.to_lowercase();

    if OFFICIAL_KEYWORDS.iter().any(|kw| channel_lower.contains(kw)) {
        return true;
    }

    if let Some(artist) = artist {
        let artist_norm = normalize(artist);
        let channel_norm = normalize(channel);

        if !artist_norm.is_empty()
            && (channel_norm.contains(&artist_norm) || artist_norm.contains(&channel_norm))
        {
            return true;
        }
    }

    false
}

/// Calcula el score de un candidato para el modo "song".
///
/// Devuelve `None` si el candidato queda excluido (keyword de versión no
/// original, o canal no oficial). Score más alto = mejor; el match exacto
/// normalizado vale 100 y corta el resto de bonificaciones.
pub fn score_candidate(query: &str, candidate: &SearchCandidate) -> Option<i32> {
    let title_lower = candidate.title.to_lowercase();

    let parsed = parse_title(&candidate.title, &candidate.channel);
    let artist = parsed.artist.as_deref().unwrap_or(&candidate.channel);

    if !is_official_channel(&candidate.channel, Some(artist)) {
        return None;
    }

    if SKIP_KEYWORDS.iter().any(|kw| title_lower.contains(kw)) {
        return None;
    }

    let query_clean = normalize(query);
    let song_clean = normalize(&parsed.song);

    if song_clean == query_clean {
        return Some(100);
    }

    let query_words: HashSet<&str> = query_clean.split_whitespace().collect();
    let song_words: HashSet<&str> = song_clean.split_whitespace().collect();
    let common = query_words.intersection(&song_words).count() as i32;

    let mut score = common * 10;

    if query_clean.contains(&song_clean) || song_clean.contains(&query_clean) {
        score += 20;
    }

    let channel_lower = candidate.channel.to_lowercase();
    if channel_lower.contains("vevo") {
        score += 15;
    } else if channel_lower.contains("official") {
        score += 10;
    }

    if title_lower.contains("official audio") {
        score += 5;
    } else if title_lower.contains("official music video") {
        score += 3;
    }

    Some(score)
}

/// Recorre los candidatos en el orden del proveedor y devuelve el de score
/// estrictamente mayor; en empate gana el primero visto. `None` si ninguno
/// es elegible.
pub fn select_best_match<'a>(
    query: &str,
    candidates: &'a [SearchCandidate],
) -> Option<&'a SearchCandidate> {
    let mut best: Option<(&SearchCandidate, i32)> = None;

    for candidate in candidates {
        if let Some(score) = score_candidate(query, candidate) {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
    }

    best.map(|(candidate, _)| candidate)
}

/// Filtra resultados para los modos "artist" y "genre".
///
/// Mantiene el orden del proveedor; descarta candidatos incompletos, canales
/// no oficiales y títulos limpios repetidos. En modo género descarta además
/// canales repetidos para forzar variedad de artistas. Máximo 10 resultados.
pub fn filter_results(candidates: &[SearchCandidate], mode: SearchMode) -> Vec<SearchCandidate> {
    let mut filtered = Vec::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut seen_channels: HashSet<String> = HashSet::new();

    for candidate in candidates {
        if candidate.video_id.is_empty()
            || candidate.title.is_empty()
            || candidate.channel.is_empty()
        {
            continue;
        }

        if !is_official_channel(&candidate.channel, None) {
            continue;
        }

        if mode == SearchMode::Genre {
            let channel_lower = candidate.channel.to_lowercase();
            if seen_channels.contains(&channel_lower) {
                continue;
            }
            seen_channels.insert(channel_lower);
        }

        let title_key = clean_title(&candidate.title).to_lowercase();
        if seen_titles.contains(&title_key) {
            continue;
        }
        seen_titles.insert(title_key);

        filtered.push(candidate.clone());
        if filtered.len() >= 10 {
            break;
        }
    }

    filtered
}
