//! Real-time pacing of highlighted line indices.
//!
//! Every `start` opens a new epoch seeded from a fresh playback snapshot and
//! invalidates the previous one. A running schedule is never adjusted in
//! place: seeks, play/pause flips, document switches and delay changes all go
//! through `start` again.

use crate::lyrics::LyricsDocument;
use crate::position::active_line;
use crate::state::PlaybackSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// No document selected.
    #[default]
    Idle,
    /// Document selected, player paused: one emission, then nothing.
    Paused,
    /// Document selected, player playing: emissions follow the clock.
    Playing,
}

/// One emission: the active line (`None` before the first line) tagged with
/// the epoch that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTick {
    pub epoch: u64,
    pub index: Option<usize>,
}

pub struct HighlightScheduler {
    tx: mpsc::UnboundedSender<HighlightTick>,
    epoch: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
    state: SchedulerState,
}

impl HighlightScheduler {
    /// Creates an idle scheduler and the receiver its ticks are delivered on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HighlightTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            epoch: Arc::new(AtomicU64::new(0)),
            task: None,
            state: SchedulerState::Idle,
        };
        (scheduler, rx)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Whether a tick belongs to the current epoch. Stale ticks must be dropped.
    pub fn is_current(&self, tick: &HighlightTick) -> bool {
        tick.epoch == self.epoch()
    }

    /// Begin a new epoch for `document` from `playback`, cancelling the previous one.
    ///
    /// The line already active is emitted immediately. When playing, each
    /// later line is emitted once the wall clock has advanced by its distance
    /// from the effective offset `playback.time - fix_delay`.
    pub fn start(&mut self, document: &LyricsDocument, playback: PlaybackSnapshot, fix_delay: f64) -> u64 {
        let epoch = self.invalidate();

        let offset = playback.time - fix_delay;
        let offset = if offset.is_finite() { offset } else { 0.0 };
        let active = active_line(offset, &document.lines);
        let first = active.map_or(0, |i| i + 1);

        self.emit(HighlightTick { epoch, index: active });

        if !playback.is_playing {
            self.state = SchedulerState::Paused;
            trace!(epoch, first, "scheduler paused");
            return epoch;
        }

        self.state = SchedulerState::Playing;
        trace!(epoch, first, offset, "scheduler playing");
        if first < document.lines.len() {
            let lines = Arc::clone(&document.lines);
            let tx = self.tx.clone();
            let current = Arc::clone(&self.epoch);
            let epoch_start = Instant::now();
            self.task = Some(tokio::spawn(async move {
                for (i, line) in lines.iter().enumerate().skip(first) {
                    let delta = (line.time - offset).max(0.0);
                    sleep_until(epoch_start + Duration::from_secs_f64(delta)).await;
                    if current.load(Ordering::Acquire) != epoch {
                        return;
                    }
                    if tx.send(HighlightTick { epoch, index: Some(i) }).is_err() {
                        return;
                    }
                }
            }));
        }
        epoch
    }

    /// Cancel the current epoch and go idle.
    pub fn stop(&mut self) {
        let epoch = self.invalidate();
        self.state = SchedulerState::Idle;
        trace!(epoch, "scheduler stopped");
    }

    fn invalidate(&mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn emit(&self, tick: HighlightTick) {
        // Receiver gone means the session is shutting down.
        let _ = self.tx.send(tick);
    }
}

impl Drop for HighlightScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricLine;

    fn doc(times: &[f64]) -> LyricsDocument {
        let lines = times
            .iter()
            .enumerate()
            .map(|(i, t)| LyricLine::new(*t, format!("line {i}")))
            .collect();
        LyricsDocument::new(lines, 1.0, "test")
    }

    /// Receive the next tick and how much virtual time passed waiting for it.
    async fn next_tick(rx: &mut mpsc::UnboundedReceiver<HighlightTick>) -> (HighlightTick, Duration) {
        let before = Instant::now();
        let tick = rx.recv().await.expect("scheduler channel closed");
        (tick, before.elapsed())
    }

    fn assert_elapsed(elapsed: Duration, secs: f64) {
        let diff = (elapsed.as_secs_f64() - secs).abs();
        assert!(diff < 0.01, "expected ~{secs}s, waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_playing_emits_active_then_next_on_time() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let epoch = scheduler.start(&doc(&[0.0, 2.0, 5.0]), PlaybackSnapshot::playing(3.0), 0.0);
        assert_eq!(scheduler.state(), SchedulerState::Playing);

        let (tick, waited) = next_tick(&mut rx).await;
        assert_eq!(tick, HighlightTick { epoch, index: Some(1) });
        assert_elapsed(waited, 0.0);

        let (tick, waited) = next_tick(&mut rx).await;
        assert_eq!(tick, HighlightTick { epoch, index: Some(2) });
        assert_elapsed(waited, 2.0);

        // Past the last line: no further emissions, state unchanged.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.state(), SchedulerState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_emits_once() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let epoch = scheduler.start(&doc(&[0.0, 2.0, 5.0]), PlaybackSnapshot::paused(3.0), 0.0);
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        assert_eq!(rx.recv().await, Some(HighlightTick { epoch, index: Some(1) }));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_back_before_first_line() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let d = doc(&[1.0, 2.0, 5.0]);
        let first = scheduler.start(&d, PlaybackSnapshot::playing(3.0), 0.0);
        assert_eq!(rx.recv().await, Some(HighlightTick { epoch: first, index: Some(1) }));

        let epoch = scheduler.start(&d, PlaybackSnapshot::playing(0.5), 0.0);
        assert_ne!(epoch, first);

        let (tick, waited) = next_tick(&mut rx).await;
        assert_eq!(tick, HighlightTick { epoch, index: None });
        assert_elapsed(waited, 0.0);

        let started = Instant::now();
        for (expected, at) in [(0, 0.5), (1, 1.5), (2, 4.5)] {
            let (tick, _) = next_tick(&mut rx).await;
            assert_eq!(tick, HighlightTick { epoch, index: Some(expected) });
            assert_elapsed(started.elapsed(), at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_back_onto_first_line() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let d = doc(&[0.0, 2.0, 5.0]);
        scheduler.start(&d, PlaybackSnapshot::playing(3.0), 0.0);
        let _ = rx.recv().await;

        // The first line starts at 0.0, so it is already active at 0.5.
        let epoch = scheduler.start(&d, PlaybackSnapshot::playing(0.5), 0.0);
        let (tick, waited) = next_tick(&mut rx).await;
        assert_eq!(tick, HighlightTick { epoch, index: Some(0) });
        assert_elapsed(waited, 0.0);

        let started = Instant::now();
        for (expected, at) in [(1, 1.5), (2, 4.5)] {
            let (tick, _) = next_tick(&mut rx).await;
            assert_eq!(tick, HighlightTick { epoch, index: Some(expected) });
            assert_elapsed(started.elapsed(), at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous_epoch() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let a = doc(&[0.0, 1.0, 2.0, 3.0]);
        let b = doc(&[10.0, 20.0]);
        let epoch_a = scheduler.start(&a, PlaybackSnapshot::playing(0.0), 0.0);
        let epoch_b = scheduler.start(&b, PlaybackSnapshot::playing(0.0), 0.0);

        let mut observed = Vec::new();
        tokio::time::sleep(Duration::from_secs(30)).await;
        while let Ok(tick) = rx.try_recv() {
            if scheduler.is_current(&tick) {
                observed.push(tick);
            } else {
                // Only A's immediate emission can be left in the queue.
                assert_eq!(tick, HighlightTick { epoch: epoch_a, index: Some(0) });
            }
        }
        assert_eq!(
            observed,
            vec![
                HighlightTick { epoch: epoch_b, index: None },
                HighlightTick { epoch: epoch_b, index: Some(0) },
                HighlightTick { epoch: epoch_b, index: Some(1) },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_goes_idle_and_silences() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        scheduler.start(&doc(&[0.0, 1.0, 2.0]), PlaybackSnapshot::playing(0.0), 0.0);
        let _ = rx.recv().await;
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(tick) = rx.try_recv() {
            assert!(!scheduler.is_current(&tick));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fix_delay_shifts_offset() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let d = doc(&[0.0, 2.0, 5.0]);

        // Reported 3.0 with 1.5s latency: effectively at 1.5.
        let epoch = scheduler.start(&d, PlaybackSnapshot::playing(3.0), 1.5);
        assert_eq!(rx.recv().await, Some(HighlightTick { epoch, index: Some(0) }));
        let (tick, waited) = next_tick(&mut rx).await;
        assert_eq!(tick.index, Some(1));
        assert_elapsed(waited, 0.5);

        // Negative delay moves the offset forward.
        let epoch = scheduler.start(&d, PlaybackSnapshot::paused(3.0), -2.0);
        assert_eq!(rx.recv().await, Some(HighlightTick { epoch, index: Some(2) }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_emissions_are_non_decreasing() {
        let (mut scheduler, mut rx) = HighlightScheduler::new();
        let d = doc(&[0.0, 0.2, 0.2, 0.45, 0.9, 1.0, 1.0, 3.3]);
        scheduler.start(&d, PlaybackSnapshot::playing(0.1), 0.0);

        let mut last = None;
        let mut count = 0;
        while count < d.lines.len() {
            let tick = rx.recv().await.unwrap();
            assert!(tick.index >= last, "{:?} after {:?}", tick.index, last);
            last = tick.index;
            count += 1;
        }
        assert_eq!(last, Some(d.lines.len() - 1));
    }
}
