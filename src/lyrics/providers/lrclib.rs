use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::lyrics::parse::parse_synced_lyrics;
use crate::lyrics::providers::{LyricsProvider, LyricsQuery};
use crate::lyrics::similarity::{MatchCandidate, song_similarity};
use crate::lyrics::types::{LyricsDocument, LyricsError};

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrcLibRecord {
    #[serde(default)]
    track_name: String,
    #[serde(default)]
    artist_name: String,
    album_name: Option<String>,
    duration: Option<f64>,
    synced_lyrics: Option<String>,
}

/// Community time-synced lyrics from lrclib.net.
///
/// Uses the search endpoint so every synced match becomes its own candidate.
pub struct LrclibProvider {
    client: Client,
}

impl LrclibProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn search(&self, query: &LyricsQuery) -> Result<Vec<LyricsDocument>, LyricsError> {
        let url = build_search_url(query);
        debug!(%url, "lrclib search");

        let resp = self.client.get(&url).send().await?;

        // 404 means no lyrics found - not an error
        if resp.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(LyricsError::Api(format!("lrclib: HTTP {}", resp.status())));
        }

        let records: Vec<LrcLibRecord> = resp.json().await?;
        Ok(records_to_documents(records, query, self.name()))
    }
}

fn build_search_url(query: &LyricsQuery) -> String {
    let mut params = vec![format!("track_name={}", urlencoding::encode(&query.title))];
    if !query.artist.is_empty() {
        params.push(format!("artist_name={}", urlencoding::encode(&query.artist)));
    }
    format!("{}/search?{}", LRCLIB_API_URL, params.join("&"))
}

fn records_to_documents(
    records: Vec<LrcLibRecord>,
    query: &LyricsQuery,
    source: &str,
) -> Vec<LyricsDocument> {
    records
        .into_iter()
        .filter_map(|record| {
            let synced = record.synced_lyrics.as_deref().filter(|s| !s.trim().is_empty())?;
            let lines = parse_synced_lyrics(synced);
            if lines.is_empty() {
                return None;
            }
            let quality = song_similarity(
                &MatchCandidate {
                    title: &record.track_name,
                    artist: &record.artist_name,
                    album: record.album_name.as_deref(),
                    duration: record.duration,
                },
                query,
            );
            Some(LyricsDocument::new(lines, quality, source))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> LyricsQuery {
        LyricsQuery {
            title: "Song & Dance".into(),
            artist: "Band".into(),
            album: None,
            duration: Some(200.0),
        }
    }

    #[test]
    fn test_build_search_url_encodes_params() {
        let url = build_search_url(&query());
        assert_eq!(
            url,
            "https://lrclib.net/api/search?track_name=Song%20%26%20Dance&artist_name=Band"
        );
    }

    #[test]
    fn test_records_without_synced_lyrics_are_skipped() {
        let json = r#"[
            {"trackName":"Song & Dance","artistName":"Band","albumName":null,"duration":200.0,
             "syncedLyrics":"[00:01.00]one\n[00:02.00]two"},
            {"trackName":"Song & Dance","artistName":"Band","duration":200.0,"syncedLyrics":null},
            {"trackName":"Other","artistName":"Someone","duration":90.0,"syncedLyrics":"[00:03.00]x"}
        ]"#;
        let records: Vec<LrcLibRecord> = serde_json::from_str(json).unwrap();
        let docs = records_to_documents(records, &query(), "lrclib");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].lines.len(), 2);
        assert_eq!(docs[0].source, "lrclib");
        assert!(docs[0].quality > docs[1].quality);
    }
}
