use crate::lyrics::types::LyricLine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static TIME_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,3}):(\d{2})(?:[.:](\d{1,3}))?\]").unwrap());

static OFFSET_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\[offset:\s*([+-]?\d+)\s*\]").unwrap());

/// Seconds represented by the captures of one `[mm:ss.xx]` tag.
fn tag_seconds(cap: &regex::Captures<'_>) -> f64 {
    let min = cap
        .get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);
    let sec = cap
        .get(2)
        .and_then(|s| s.as_str().parse::<u32>().ok())
        .unwrap_or(0);
    // One digit is tenths, two hundredths, three milliseconds.
    let frac = cap
        .get(3)
        .map(|f| {
            let digits = f.as_str();
            let value = digits.parse::<u32>().unwrap_or(0) as f64;
            value / 10f64.powi(digits.len() as i32)
        })
        .unwrap_or(0.0);
    min as f64 * 60.0 + sec as f64 + frac
}

/// Parse LRC text into lines sorted by start time.
///
/// Lines carrying several time tags are emitted once per tag. An `[offset:ms]`
/// header moves every line earlier by `ms` milliseconds (later if negative).
pub fn parse_synced_lyrics(synced: &str) -> Vec<LyricLine> {
    let re = &TIME_TAG_RE;
    let mut offset = 0.0;
    let mut lines = Vec::new();
    for line in synced.lines() {
        if let Some(cap) = OFFSET_TAG_RE.captures(line) {
            offset = cap
                .get(1)
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .map(|ms| ms as f64 / 1000.0)
                .unwrap_or(0.0);
            continue;
        }
        let matches: Vec<_> = re.captures_iter(line).collect();
        if matches.is_empty() {
            continue;
        }
        let text = re.replace_all(line, "").trim().to_string();
        if text.is_empty() {
            continue;
        }
        for cap in matches {
            lines.push(LyricLine {
                time: tag_seconds(&cap),
                text: text.clone(),
            });
        }
    }
    if offset != 0.0 {
        for line in &mut lines {
            line.time -= offset;
        }
    }
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Parse a Musixmatch `subtitle_body` (JSON array of `{text, time: {total}}`).
pub fn parse_subtitle_body(subtitle_body: &str) -> Option<Vec<LyricLine>> {
    let val = serde_json::from_str::<Value>(subtitle_body).ok()?;
    let arr = val.as_array()?;
    let lines = arr
        .iter()
        .map(|line| {
            let time = line
                .pointer("/time/total")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let text = line
                .get("text")
                .and_then(Value::as_str)
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("\u{266a}");
            LyricLine::new(time, text)
        })
        .collect();
    Some(lines)
}

/// Parse a Musixmatch `richsync_body` at line granularity: each entry's
/// `ts` becomes the start time and `x` the text. Word timings are ignored.
pub fn parse_richsync_body(richsync_body: &str) -> Option<Vec<LyricLine>> {
    let val = serde_json::from_str::<Value>(richsync_body).ok()?;
    let arr = val.as_array()?;
    let lines = arr
        .iter()
        .map(|line| {
            let time = line.get("ts").and_then(Value::as_f64).unwrap_or(0.0);
            let text = line
                .get("x")
                .and_then(Value::as_str)
                .or_else(|| line.get("text").and_then(Value::as_str))
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("\u{266a}");
            LyricLine::new(time, text)
        })
        .collect();
    Some(lines)
}
