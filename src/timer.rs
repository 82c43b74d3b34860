use crate::state::PlaybackSnapshot;
use tokio::time::Instant;

/// Anchors the last reported playback snapshot to a monotonic instant so a
/// live position can be derived between player reports.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    anchor: PlaybackSnapshot,
    anchored_at: Instant,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(PlaybackSnapshot::default())
    }
}

impl PlaybackClock {
    pub fn new(snapshot: PlaybackSnapshot) -> Self {
        Self {
            anchor: sanitize(snapshot),
            anchored_at: Instant::now(),
        }
    }

    /// Re-anchor on a fresh report from the player.
    pub fn reset(&mut self, snapshot: PlaybackSnapshot) {
        *self = Self::new(snapshot);
    }

    /// The reported snapshot advanced by the time elapsed since it arrived,
    /// when playing. A paused clock stays where it was reported.
    pub fn now(&self) -> PlaybackSnapshot {
        if !self.anchor.is_playing {
            return self.anchor;
        }
        let time = self.anchor.time + self.anchored_at.elapsed().as_secs_f64();
        PlaybackSnapshot {
            time: if time.is_finite() { time } else { self.anchor.time },
            is_playing: true,
        }
    }
}

pub fn sanitize_position(p: f64) -> f64 {
    if !p.is_finite() || p < 0.0 {
        // Negative positions are not meaningful; clamp to zero.
        0.0
    } else {
        p
    }
}

fn sanitize(snapshot: PlaybackSnapshot) -> PlaybackSnapshot {
    PlaybackSnapshot {
        time: sanitize_position(snapshot.time),
        ..snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_playing_clock_advances() {
        let clock = PlaybackClock::new(PlaybackSnapshot::playing(3.0));
        tokio::time::advance(Duration::from_millis(1500)).await;
        let now = clock.now();
        assert!(now.is_playing);
        assert!((now.time - 4.5).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_clock_holds() {
        let clock = PlaybackClock::new(PlaybackSnapshot::paused(3.0));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(clock.now(), PlaybackSnapshot::paused(3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_reanchors() {
        let mut clock = PlaybackClock::new(PlaybackSnapshot::playing(10.0));
        tokio::time::advance(Duration::from_secs(2)).await;
        clock.reset(PlaybackSnapshot::playing(0.5));
        assert!((clock.now().time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sanitize_position() {
        assert_eq!(sanitize_position(f64::NAN), 0.0);
        assert_eq!(sanitize_position(-2.0), 0.0);
        assert_eq!(sanitize_position(f64::INFINITY), 0.0);
        assert_eq!(sanitize_position(1.25), 1.25);
    }
}
