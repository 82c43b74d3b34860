//! The session coordinator: sole owner of the highlight state.
//!
//! Player events, key commands, fetch completions and scheduler ticks all
//! arrive on channels consumed by one task, so no two writers ever race on
//! the document selection or the highlighted line. After every input the
//! render projection is recomputed and published only if it changed.

use crate::event::{Command, SessionEvent, Transport};
use crate::lyrics::{CandidateSet, Cycle, LyricsQuery, LyricsSource};
use crate::mpris::{PlayerControl, TrackMetadata};
use crate::scheduler::{HighlightScheduler, HighlightTick};
use crate::state::{HighlightState, PlaybackSnapshot};
use crate::timer::PlaybackClock;
use crate::ui::view::{Geometry, Projection, RenderState};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct SessionCoordinator {
    highlight: HighlightState,
    track: Option<TrackMetadata>,
    candidates: CandidateSet,
    document_index: usize,
    clock: PlaybackClock,
    fix_delay: f64,
    reloading: bool,
    geometry: Geometry,

    scheduler: HighlightScheduler,
    ticks: mpsc::UnboundedReceiver<HighlightTick>,

    source: Arc<LyricsSource>,
    fetch: Option<JoinHandle<()>>,
    fetch_generation: u64,

    player: Arc<dyn PlayerControl>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    render_tx: watch::Sender<RenderState>,
}

impl SessionCoordinator {
    pub fn new(
        source: Arc<LyricsSource>,
        player: Arc<dyn PlayerControl>,
        fix_delay: f64,
        geometry: Geometry,
    ) -> Self {
        let (scheduler, ticks) = HighlightScheduler::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (render_tx, _) = watch::channel(RenderState::default());
        let session = Self {
            highlight: HighlightState::default(),
            track: None,
            candidates: CandidateSet::default(),
            document_index: 0,
            clock: PlaybackClock::default(),
            fix_delay,
            reloading: false,
            geometry,
            scheduler,
            ticks,
            source,
            fetch: None,
            fetch_generation: 0,
            player,
            events_tx,
            events_rx,
            render_tx,
        };
        session.publish();
        session
    }

    /// Sender for everything feeding this session.
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Receiver of render projections. Closes when the session ends.
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.render_tx.subscribe()
    }

    /// Process events until a quit command arrives.
    pub async fn run(mut self) {
        loop {
            let flow = tokio::select! {
                biased;
                Some(event) = self.events_rx.recv() => self.handle(event),
                Some(tick) = self.ticks.recv() => {
                    self.on_highlight(tick);
                    Flow::Continue
                }
                else => Flow::Quit,
            };
            self.drain_ticks();
            self.publish();
            if flow == Flow::Quit {
                info!("session finished");
                return;
            }
        }
    }

    fn handle(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::TrackChanged { track, playback } => self.on_track_change(track, playback),
            SessionEvent::PlaybackChanged(playback) => self.on_playback(playback),
            SessionEvent::LyricsFetched { generation, candidates } => {
                self.on_fetched(generation, candidates)
            }
            SessionEvent::Resized { width, height } => {
                self.geometry = Geometry { width, height };
            }
            SessionEvent::Command(command) => return self.on_command(command),
        }
        Flow::Continue
    }

    fn on_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::Reload => self.on_reload(),
            Command::CycleDocument(direction) => self.on_cycle(direction),
            Command::Transport(transport) => self.forward(transport),
            Command::ShiftDelay(delta) => self.on_shift_delay(delta),
        }
        Flow::Continue
    }

    fn on_track_change(&mut self, track: Option<TrackMetadata>, playback: PlaybackSnapshot) {
        info!(?track, "track changed");
        self.clock.reset(playback);
        self.highlight.playback = self.clock.now();
        self.track = track;
        self.candidates = CandidateSet::default();
        self.document_index = 0;
        self.highlight.clear_document();
        self.scheduler.stop();
        self.reloading = false;
        self.spawn_fetch();
    }

    fn on_playback(&mut self, playback: PlaybackSnapshot) {
        debug!(time = playback.time, playing = playback.is_playing, "playback changed");
        self.clock.reset(playback);
        self.restart();
    }

    /// Refetch without blanking the current document.
    fn on_reload(&mut self) {
        if self.track.is_none() {
            return;
        }
        info!("reloading lyrics");
        self.reloading = true;
        self.spawn_fetch();
    }

    fn on_cycle(&mut self, direction: Cycle) {
        let Some(index) = self.candidates.cycle(self.document_index, direction) else {
            return;
        };
        let Some(document) = self.candidates.get(index).cloned() else {
            return;
        };
        debug!(index, source = %document.source, "switching document");
        self.document_index = index;
        self.highlight.select(document);
        self.restart();
    }

    fn on_shift_delay(&mut self, delta: f64) {
        let shifted = ((self.fix_delay + delta) * 1000.0).round() / 1000.0;
        if !shifted.is_finite() {
            return;
        }
        self.fix_delay = shifted;
        debug!(fix_delay = self.fix_delay, "fix delay changed");
        self.restart();
    }

    fn on_fetched(&mut self, generation: u64, candidates: CandidateSet) {
        if generation != self.fetch_generation {
            trace!(generation, current = self.fetch_generation, "dropping stale fetch");
            return;
        }
        if candidates.is_empty() {
            info!("no lyrics found");
        } else {
            info!(count = candidates.len(), "lyrics fetched");
        }
        self.fetch = None;
        self.reloading = false;
        self.candidates = candidates;
        self.document_index = 0;
        match self.candidates.get(0).cloned() {
            Some(document) => self.highlight.select(document),
            None => self.highlight.clear_document(),
        }
        self.restart();
    }

    fn on_highlight(&mut self, tick: HighlightTick) {
        if !self.scheduler.is_current(&tick) {
            trace!(epoch = tick.epoch, "dropping stale tick");
            return;
        }
        self.highlight.update_line(tick.index);
    }

    /// Begin a new scheduling epoch from the live clock, or go idle without a document.
    fn restart(&mut self) {
        self.highlight.playback = self.clock.now();
        match &self.highlight.document {
            Some(document) => {
                let epoch = self.scheduler.start(document, self.highlight.playback, self.fix_delay);
                trace!(epoch, state = ?self.scheduler.state(), "highlight restarted");
            }
            None => {
                self.scheduler.stop();
                self.highlight.line = None;
            }
        }
    }

    /// Start a fetch for the current track, superseding any in flight.
    fn spawn_fetch(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
        self.fetch_generation += 1;
        let Some(track) = &self.track else {
            return;
        };
        let generation = self.fetch_generation;
        let query = LyricsQuery::from(track);
        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        self.fetch = Some(tokio::spawn(async move {
            let candidates = source.fetch(&query).await;
            let _ = events.send(SessionEvent::LyricsFetched { generation, candidates });
        }));
    }

    fn forward(&self, transport: Transport) {
        let player = Arc::clone(&self.player);
        tokio::spawn(async move {
            let result = match transport {
                Transport::PlayPause => player.play_pause().await,
                Transport::SkipNext => player.skip_next().await,
                Transport::SkipPrevious => player.skip_previous().await,
            };
            if let Err(e) = result {
                warn!(error = %e, ?transport, "player command failed");
            }
        });
    }

    fn drain_ticks(&mut self) {
        while let Ok(tick) = self.ticks.try_recv() {
            self.on_highlight(tick);
        }
    }

    fn publish(&self) {
        let next = RenderState::project(&Projection {
            highlight: &self.highlight,
            track: self.track.as_ref(),
            document_index: self.document_index,
            document_count: self.candidates.len(),
            reloading: self.reloading,
            fix_delay: self.fix_delay,
            geometry: self.geometry,
        });
        self.render_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.fetch.take() {
            task.abort();
        }
    }
}
