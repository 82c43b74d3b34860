//! Watches the active MPRIS player and turns its signals into session events.

use crate::event::SessionEvent;
use crate::mpris::connection::{
    MprisError, PlayerctldProxy, get_active_player_names, get_dbus_conn, pick_player,
};
use crate::mpris::metadata::{TrackMetadata, extract_metadata};
use crate::mpris::playback::snapshot_from;
use crate::state::PlaybackSnapshot;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use zbus::proxy;
use zvariant::OwnedValue;

const RESCAN_INTERVAL: Duration = Duration::from_secs(1);

#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MediaPlayer2Player {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> zbus::Result<i64>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(signal)]
    fn seeked(&self, position: i64) -> zbus::Result<()>;
}

/// What the watcher last reported for the followed player.
#[derive(Debug, Clone, Default)]
struct PlayerState {
    service: Option<String>,
    track: Option<TrackMetadata>,
    playback_status: String,
}

/// Follows one unblocked player at a time and reports its changes.
pub struct PlayerWatcher {
    events: mpsc::UnboundedSender<SessionEvent>,
    service_tx: watch::Sender<Option<String>>,
    block_list: Arc<Vec<String>>,
    state: PlayerState,
    conn: Arc<zbus::Connection>,
}

impl PlayerWatcher {
    /// Connects to the session bus. Failing here is fatal for the caller.
    ///
    /// The followed player's service name is published on `service_tx` so
    /// commands can be sent to it.
    pub async fn new(
        events: mpsc::UnboundedSender<SessionEvent>,
        block_list: Vec<String>,
        service_tx: watch::Sender<Option<String>>,
    ) -> Result<Self, MprisError> {
        let conn = get_dbus_conn().await?;
        Ok(Self {
            events,
            service_tx,
            block_list: Arc::new(block_list),
            state: PlayerState::default(),
            conn,
        })
    }

    /// Watch forever, or until the session stops listening.
    pub async fn run(mut self) -> Result<(), MprisError> {
        self.discover_active_player().await?;

        let playerctld = PlayerctldProxy::new(&self.conn).await.ok();
        let mut player_names_stream = match playerctld {
            Some(ref proxy) => Some(proxy.receive_player_names_changed().await),
            None => None,
        };

        while !self.events.is_closed() {
            tokio::select! {
                Some(_) = async {
                    match player_names_stream {
                        Some(ref mut stream) => stream.next().await,
                        None => None,
                    }
                } => {
                    if let Err(e) = self.discover_active_player().await {
                        warn!(error = %e, "player discovery failed");
                    }
                }

                result = self.follow_player() => {
                    if let Err(e) = result {
                        debug!(error = %e, "lost player");
                        tokio::time::sleep(RESCAN_INTERVAL).await;
                    }
                    if let Err(e) = self.discover_active_player().await {
                        warn!(error = %e, "player discovery failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Forward the current player's signals until it disappears.
    async fn follow_player(&mut self) -> Result<(), MprisError> {
        let Some(service) = self.state.service.clone() else {
            tokio::time::sleep(RESCAN_INTERVAL).await;
            return Ok(());
        };

        let proxy = MediaPlayer2PlayerProxy::builder(&self.conn)
            .destination(service.as_str())?
            .build()
            .await?;

        let mut seeked_stream = proxy.receive_seeked().await?;
        let mut metadata_stream = proxy.receive_metadata_changed().await;
        let mut status_stream = proxy.receive_playback_status_changed().await;

        loop {
            tokio::select! {
                Some(signal) = seeked_stream.next() => {
                    if let Ok(args) = signal.args() {
                        let snapshot = snapshot_from(&self.state.playback_status, *args.position());
                        self.emit(SessionEvent::PlaybackChanged(snapshot));
                    }
                }

                Some(_) = metadata_stream.next() => {
                    self.handle_metadata_change(&proxy).await?;
                }

                Some(_) = status_stream.next() => {
                    self.handle_status_change(&proxy).await?;
                }

                _ = tokio::time::sleep(RESCAN_INTERVAL) => {
                    if proxy.playback_status().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_metadata_change(
        &mut self,
        proxy: &MediaPlayer2PlayerProxy<'_>,
    ) -> Result<(), MprisError> {
        let track = extract_metadata(&proxy.metadata().await?);
        if track != self.state.track {
            self.state.track = track.clone();
            let playback = self.fresh_snapshot(proxy).await;
            debug!(?track, "track changed");
            self.emit(SessionEvent::TrackChanged { track, playback });
        }
        Ok(())
    }

    async fn handle_status_change(
        &mut self,
        proxy: &MediaPlayer2PlayerProxy<'_>,
    ) -> Result<(), MprisError> {
        let status = proxy.playback_status().await?;
        if status != self.state.playback_status {
            self.state.playback_status = status;
            let playback = self.fresh_snapshot(proxy).await;
            self.emit(SessionEvent::PlaybackChanged(playback));
        }
        Ok(())
    }

    /// Position is not signalled by players, so it is read on every change.
    async fn fresh_snapshot(&self, proxy: &MediaPlayer2PlayerProxy<'_>) -> PlaybackSnapshot {
        let position = proxy.position().await.unwrap_or(0);
        snapshot_from(&self.state.playback_status, position)
    }

    /// Switch to the first unblocked active player, or report that none is left.
    async fn discover_active_player(&mut self) -> Result<(), MprisError> {
        let names = get_active_player_names(&self.conn).await?;
        match pick_player(&names, &self.block_list) {
            Some(service) if self.state.service.as_deref() != Some(service) => {
                let service = service.to_string();
                self.switch_to_player(service).await?;
            }
            Some(_) => {}
            None if self.state.service.is_some() => self.deactivate_player(),
            None => {}
        }
        Ok(())
    }

    async fn switch_to_player(&mut self, service: String) -> Result<(), MprisError> {
        let proxy = MediaPlayer2PlayerProxy::builder(&self.conn)
            .destination(service.as_str())?
            .build()
            .await?;

        let track = proxy
            .metadata()
            .await
            .ok()
            .and_then(|map| extract_metadata(&map));
        let playback_status = proxy
            .playback_status()
            .await
            .unwrap_or_else(|_| "Stopped".to_string());

        info!(service = %service, "following player");
        self.state = PlayerState {
            service: Some(service.clone()),
            track: track.clone(),
            playback_status,
        };
        // `proxy` borrows `service` until the snapshot below is read.
        self.service_tx.send_replace(Some(service.clone()));

        let playback = self.fresh_snapshot(&proxy).await;
        self.emit(SessionEvent::TrackChanged { track, playback });
        Ok(())
    }

    fn deactivate_player(&mut self) {
        info!("no active player");
        self.state = PlayerState::default();
        self.service_tx.send_replace(None);
        self.emit(SessionEvent::TrackChanged {
            track: None,
            playback: PlaybackSnapshot::default(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session closed, dropping player event");
        }
    }
}
