//! Fuzzy matching between a lyrics query and the track a provider says it found.
//!
//! The score feeds `LyricsDocument::quality`, so candidates from different
//! providers can be ranked against each other.

use crate::lyrics::providers::LyricsQuery;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+\]").unwrap());
static PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static DASH_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s-\s.*").unwrap());
static TITLE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s|[-(])(remix|live|acoustic|instrumental|radio\sedit|remastered|explicit|clean|unplugged|edit|version|mono|stereo|deluxe|reprise|demo)(?:\W|$)").unwrap()
});

/// What a provider reports about the track its lyrics belong to.
#[derive(Debug, Clone, Default)]
pub struct MatchCandidate<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: Option<&'a str>,
    pub duration: Option<f64>,
}

fn normalize_string(s: &str) -> String {
    let lower = s.to_lowercase();
    let replaced = NON_WORD_RE.replace_all(&lower, " ");
    WHITESPACE_RE.replace_all(&replaced, " ").trim().to_string()
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn dice_coefficient(a: &str, b: &str) -> f64 {
    let a_grams = bigrams(a);
    let b_grams = bigrams(b);
    if a_grams.is_empty() && b_grams.is_empty() {
        return if a == b { 1.0 } else { 0.0 };
    }
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }
    let inter = a_grams.intersection(&b_grams).count() as f64;
    (2.0 * inter) / ((a_grams.len() + b_grams.len()) as f64)
}

fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    if s1 == s2 {
        return 0;
    }
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut curr: Vec<usize> = vec![0; a.len() + 1];
    for (j, bj) in b.iter().enumerate() {
        curr[0] = j + 1;
        for (i, ai) in a.iter().enumerate() {
            let cost = usize::from(ai != bj);
            curr[i + 1] = (prev[i + 1] + 1).min(curr[i] + 1).min(prev[i] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[a.len()]
}

/// Split a title into its base form and version tags such as "live" or "remix".
fn analyze_title(title: &str) -> (String, HashSet<String>) {
    let normalized = normalize_string(title);
    let tags = TITLE_TAG_RE
        .captures_iter(&normalized)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().replace(' ', ""))
        .collect();
    let lower = title.to_lowercase();
    let base = BRACKETS_RE.replace_all(&lower, "");
    let base = PARENS_RE.replace_all(&base, "");
    let base = DASH_SUFFIX_RE.replace_all(&base, "");
    let base = normalize_string(&base);
    let base = TITLE_TAG_RE.replace_all(&base, " ");
    let base = WHITESPACE_RE.replace_all(&base, " ").trim().to_string();
    (base, tags)
}

fn normalize_artist_name(artist: &str) -> String {
    let lower = artist.to_lowercase();
    let stripped = BRACKETS_RE.replace_all(&lower, "");
    let stripped = PARENS_RE.replace_all(&stripped, "");
    let mut parts: Vec<String> = stripped
        .split(['&', ',', ';', '/'])
        .flat_map(|s| s.split(" feat. ").flat_map(|p| p.split(" feat ")))
        .flat_map(|s| s.split(" ft. "))
        .map(normalize_string)
        .map(|p| p.strip_prefix("the ").map(str::to_string).unwrap_or(p))
        .filter(|p| !p.is_empty())
        .collect();
    parts.sort();
    parts.join(" ")
}

fn title_similarity(candidate: &str, query: &str) -> f64 {
    let (base1, tags1) = analyze_title(candidate);
    let (base2, tags2) = analyze_title(query);
    let dice = dice_coefficient(&base1, &base2);
    let max_len = base1.chars().count().max(base2.chars().count()) as f64;
    let lev = if max_len > 0.0 {
        1.0 - (levenshtein_distance(&base1, &base2) as f64 / max_len)
    } else {
        1.0
    };
    let base_score = dice * 0.6 + lev * 0.4;
    let tag_score = if tags1.is_empty() && tags2.is_empty() {
        0.05
    } else if tags1 == tags2 {
        0.1
    } else if !tags1.is_empty() && !tags2.is_empty() && tags1.is_disjoint(&tags2) {
        -0.25
    } else {
        0.0
    };
    (base_score + tag_score).clamp(0.0, 1.0)
}

fn artist_similarity(candidate: &str, query: &str) -> f64 {
    if candidate.is_empty() || query.is_empty() {
        return 0.0;
    }
    let n1 = normalize_artist_name(candidate);
    let n2 = normalize_artist_name(query);
    if n1 == n2 {
        return 1.0;
    }
    dice_coefficient(&n1, &n2)
}

fn duration_similarity(candidate: Option<f64>, query: Option<f64>) -> f64 {
    let (Some(d1), Some(d2)) = (candidate, query) else {
        return 0.5;
    };
    let diff = (d1 - d2).abs();
    if diff == 0.0 {
        return 1.0;
    }
    let avg = (d1 + d2) / 2.0;
    let perc = if avg > 0.0 { diff / avg } else { 0.0 };
    if diff <= 3.0 || perc <= 0.02 {
        0.98
    } else if diff <= 5.0 || perc <= 0.05 {
        0.95
    } else if diff <= 10.0 || perc <= 0.08 {
        0.85
    } else if diff <= 15.0 || perc <= 0.12 {
        0.7
    } else if diff <= 30.0 || perc <= 0.20 {
        0.5
    } else {
        (-diff / 60.0).exp().max(0.1) * 0.4
    }
}

/// Similarity in `0.0..=1.0` between the query and a candidate track.
///
/// Each component is weighted by how decisive it is: scores near 0.5 carry
/// little information and contribute little to the result.
pub fn song_similarity(candidate: &MatchCandidate<'_>, query: &LyricsQuery) -> f64 {
    let title_score = title_similarity(candidate.title, &query.title);
    let artist_score = artist_similarity(candidate.artist, &query.artist);
    let query_album = query.album.as_deref().filter(|a| !a.is_empty());
    let album_score = match (candidate.album, query_album) {
        (Some(c), Some(q)) => dice_coefficient(&normalize_string(c), &normalize_string(q)),
        _ => 0.0,
    };
    let duration_score = duration_similarity(candidate.duration, query.duration);

    let importance = |score: f64| ((score - 0.5).abs() * 2.0).powi(2);
    let components = [
        (title_score, importance(title_score)),
        (artist_score, importance(artist_score)),
        (
            album_score,
            if query_album.is_some() { importance(album_score) } else { 0.0 },
        ),
        (
            duration_score,
            if query.duration.is_some() { importance(duration_score) } else { 0.0 },
        ),
    ];
    let total: f64 = components.iter().map(|(_, w)| w).sum();
    if total == 0.0 {
        return 0.5;
    }
    let score: f64 = components.iter().map(|(s, w)| s * w / total).sum();
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> LyricsQuery {
        LyricsQuery {
            title: "Bohemian Rhapsody".into(),
            artist: "Queen".into(),
            album: Some("A Night at the Opera".into()),
            duration: Some(354.0),
        }
    }

    #[test]
    fn test_exact_match_scores_high() {
        let c = MatchCandidate {
            title: "Bohemian Rhapsody",
            artist: "Queen",
            album: Some("A Night at the Opera"),
            duration: Some(354.0),
        };
        assert!(song_similarity(&c, &query()) > 0.95);
    }

    #[test]
    fn test_unrelated_track_scores_low() {
        let c = MatchCandidate {
            title: "Hey Jude",
            artist: "The Beatles",
            album: None,
            duration: Some(431.0),
        };
        assert!(song_similarity(&c, &query()) < 0.3);
    }

    #[test]
    fn test_close_match_beats_wrong_version() {
        let studio = MatchCandidate {
            title: "Bohemian Rhapsody (Remastered 2011)",
            artist: "Queen",
            album: None,
            duration: Some(355.0),
        };
        let live = MatchCandidate {
            title: "Bohemian Rhapsody - Live",
            artist: "Queen",
            album: None,
            duration: Some(402.0),
        };
        assert!(song_similarity(&studio, &query()) > song_similarity(&live, &query()));
    }

    #[test]
    fn test_artist_normalization_ignores_order_and_article() {
        assert_eq!(artist_similarity("The Weeknd & Daft Punk", "Daft Punk, Weeknd"), 1.0);
    }

    #[test]
    fn test_duration_bands() {
        assert_eq!(duration_similarity(Some(200.0), Some(200.0)), 1.0);
        assert_eq!(duration_similarity(Some(200.0), Some(202.0)), 0.98);
        assert_eq!(duration_similarity(None, Some(202.0)), 0.5);
        assert!(duration_similarity(Some(100.0), Some(400.0)) < 0.1);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }
}
