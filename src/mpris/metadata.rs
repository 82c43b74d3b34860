//! Track metadata as reported by an MPRIS player.

use crate::lyrics::LyricsQuery;
use std::collections::HashMap;
use zvariant::OwnedValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Track length in seconds.
    pub length: Option<f64>,
}

impl From<&TrackMetadata> for LyricsQuery {
    fn from(track: &TrackMetadata) -> Self {
        LyricsQuery {
            title: track.title.clone(),
            artist: track.artist.clone().unwrap_or_default(),
            album: track.album.clone(),
            duration: track.length,
        }
    }
}

/// Fields pulled out of the `Metadata` a{sv} map before normalization.
#[derive(Debug, Default)]
struct RawMetadata {
    title: Option<String>,
    artist: Option<Vec<String>>,
    album: Option<String>,
    length_us: Option<i64>,
}

impl RawMetadata {
    fn from_map(map: &HashMap<String, OwnedValue>) -> Self {
        let string = |key: &str| {
            map.get(key)
                .and_then(|v| v.try_clone().ok())
                .and_then(|v| String::try_from(v).ok())
        };
        // xesam:artist is an array, but some players send a single string.
        let artist = map
            .get("xesam:artist")
            .and_then(|v| v.try_clone().ok())
            .and_then(|v| Vec::<String>::try_from(v).ok())
            .or_else(|| string("xesam:artist").map(|s| vec![s]));
        let length_us = map.get("mpris:length").and_then(|v| {
            if let Ok(i) = i64::try_from(v) {
                return Some(i);
            }
            u64::try_from(v).ok().and_then(|u| i64::try_from(u).ok())
        });
        Self {
            title: string("xesam:title"),
            artist,
            album: string("xesam:album"),
            length_us,
        }
    }

    /// `None` when the player reports no usable title, i.e. nothing is loaded.
    fn into_track(self) -> Option<TrackMetadata> {
        let non_empty = |s: String| {
            let s = s.trim().to_string();
            (!s.is_empty()).then_some(s)
        };
        let title = self.title.and_then(non_empty)?;
        let artist = self
            .artist
            .map(|names| names.into_iter().filter_map(non_empty).collect::<Vec<_>>().join(", "))
            .and_then(non_empty);
        let length = self
            .length_us
            .filter(|us| *us > 0)
            .map(|us| us as f64 / 1_000_000.0);
        Some(TrackMetadata {
            title,
            artist,
            album: self.album.and_then(non_empty),
            length,
        })
    }
}

/// Parse a player's `Metadata` property. `None` means no track is loaded.
pub fn extract_metadata(map: &HashMap<String, OwnedValue>) -> Option<TrackMetadata> {
    RawMetadata::from_map(map).into_track()
}
