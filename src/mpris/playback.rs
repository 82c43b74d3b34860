//! Playback status parsing and transport control for MPRIS players.

use crate::mpris::connection::{MPRIS_PATH, MprisError, get_dbus_conn};
use crate::state::PlaybackSnapshot;
use crate::timer::sanitize_position;
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;
use zbus::Proxy;

const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Build a snapshot from a `PlaybackStatus` string and a `Position` in microseconds.
pub fn snapshot_from(status: &str, position_us: i64) -> PlaybackSnapshot {
    PlaybackSnapshot {
        time: sanitize_position(position_us as f64 / 1_000_000.0),
        is_playing: status == "Playing",
    }
}

/// Transport commands forwarded to the external player. These never touch
/// session state; the player's own change notification does that.
#[async_trait]
pub trait PlayerControl: Send + Sync {
    async fn play_pause(&self) -> Result<(), MprisError>;
    async fn skip_next(&self) -> Result<(), MprisError>;
    async fn skip_previous(&self) -> Result<(), MprisError>;
}

/// Controls whichever player the watcher is currently following.
pub struct MprisPlayer {
    service: watch::Receiver<Option<String>>,
}

impl MprisPlayer {
    pub fn new(service: watch::Receiver<Option<String>>) -> Self {
        Self { service }
    }

    async fn call(&self, method: &str) -> Result<(), MprisError> {
        let Some(service) = self.service.borrow().clone() else {
            debug!(method, "no active player, ignoring command");
            return Ok(());
        };
        let conn = get_dbus_conn().await?;
        let proxy = Proxy::new(&conn, service.as_str(), MPRIS_PATH, PLAYER_INTERFACE).await?;
        proxy.call_method(method, &()).await?;
        debug!(method, service = %service, "sent player command");
        Ok(())
    }
}

#[async_trait]
impl PlayerControl for MprisPlayer {
    async fn play_pause(&self) -> Result<(), MprisError> {
        self.call("PlayPause").await
    }

    async fn skip_next(&self) -> Result<(), MprisError> {
        self.call("Next").await
    }

    async fn skip_previous(&self) -> Result<(), MprisError> {
        self.call("Previous").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_status() {
        assert_eq!(snapshot_from("Playing", 1_500_000), PlaybackSnapshot::playing(1.5));
        assert_eq!(snapshot_from("Paused", 42_000_000), PlaybackSnapshot::paused(42.0));
        assert_eq!(snapshot_from("Stopped", 0), PlaybackSnapshot::paused(0.0));
    }

    #[test]
    fn test_negative_position_clamped() {
        assert_eq!(snapshot_from("Playing", -3_000_000), PlaybackSnapshot::playing(0.0));
    }

    #[tokio::test]
    async fn test_command_without_player_is_noop() {
        let (_tx, rx) = watch::channel(None);
        let player = MprisPlayer::new(rx);
        assert!(player.play_pause().await.is_ok());
        assert!(player.skip_next().await.is_ok());
    }
}
