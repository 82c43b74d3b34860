use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::env;
use tracing::debug;

use crate::lyrics::parse::{parse_richsync_body, parse_subtitle_body};
use crate::lyrics::providers::{LyricsProvider, LyricsQuery};
use crate::lyrics::similarity::{MatchCandidate, song_similarity};
use crate::lyrics::types::{LyricLine, LyricsDocument, LyricsError};

const MACRO_URL: &str = "https://apic-desktop.musixmatch.com/ws/1.1/macro.subtitles.get?format=json&namespace=lyrics_richsynched&subtitle_format=mxm&app_id=web-desktop-app-v1.0&";

/// Musixmatch desktop API, authenticated with a user token.
///
/// Without `MUSIXMATCH_USERTOKEN` set the provider returns no candidates.
pub struct MusixmatchProvider {
    client: Client,
    token: Option<String>,
}

impl MusixmatchProvider {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn from_env(client: Client) -> Self {
        Self::new(client, env::var("MUSIXMATCH_USERTOKEN").ok())
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchProvider {
    fn name(&self) -> &'static str {
        "musixmatch"
    }

    async fn search(&self, query: &LyricsQuery) -> Result<Vec<LyricsDocument>, LyricsError> {
        let Some(token) = self.token.as_deref() else {
            return Ok(Vec::new());
        };

        let params = [
            ("q_artist", query.artist.as_str()),
            ("q_track", query.title.as_str()),
            ("usertoken", token),
            ("optional_calls", "track.richsync"),
        ];
        let url = MACRO_URL.to_string()
            + &params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");

        let resp = self
            .client
            .get(&url)
            .header("Cookie", format!("x-mxm-token-guid={}", token))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LyricsError::Api(format!(
                "musixmatch macro.subtitles.get: {}",
                resp.status()
            )));
        }

        let json: Value = resp.json().await?;
        Ok(document_from_macro(&json, query, self.name())
            .into_iter()
            .collect())
    }
}

fn status_ok(call: &Value) -> bool {
    call.pointer("/message/header/status_code")
        .and_then(Value::as_i64)
        == Some(200)
}

/// Prefer richsync start times, fall back to the plain subtitle track.
fn lines_from_macro(macro_calls: &Value) -> Option<Vec<LyricLine>> {
    let richsync = macro_calls
        .get("track.richsync.get")
        .filter(|c| status_ok(c))
        .and_then(|c| c.pointer("/message/body/richsync/richsync_body"))
        .and_then(Value::as_str)
        .and_then(parse_richsync_body)
        .filter(|lines| !lines.is_empty());
    if richsync.is_some() {
        return richsync;
    }
    macro_calls
        .get("track.subtitles.get")
        .filter(|c| status_ok(c))
        .and_then(|c| c.pointer("/message/body/subtitle_list/0/subtitle/subtitle_body"))
        .and_then(Value::as_str)
        .and_then(parse_subtitle_body)
        .filter(|lines| !lines.is_empty())
}

fn document_from_macro(json: &Value, query: &LyricsQuery, source: &str) -> Option<LyricsDocument> {
    let macro_calls = json.pointer("/message/body/macro_calls")?;
    let matcher = macro_calls.get("matcher.track.get")?;
    if !status_ok(matcher) {
        debug!("musixmatch matcher found no track");
        return None;
    }
    let lines = lines_from_macro(macro_calls)?;

    let track = matcher.pointer("/message/body/track");
    let field = |key: &str| {
        track
            .and_then(|t| t.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    };
    let quality = song_similarity(
        &MatchCandidate {
            title: field("track_name"),
            artist: field("artist_name"),
            album: Some(field("album_name")).filter(|a| !a.is_empty()),
            duration: track
                .and_then(|t| t.get("track_length"))
                .and_then(Value::as_f64),
        },
        query,
    );
    Some(LyricsDocument::new(lines, quality, source))
}
