use crate::lyrics::{CandidateSet, Cycle};
use crate::mpris::TrackMetadata;
use crate::state::PlaybackSnapshot;

/// Everything the session coordinator reacts to. Player observation,
/// terminal input and fetch completions are all funnelled into one queue of
/// these so a single task owns every mutation.
#[derive(Debug)]
pub enum SessionEvent {
    /// The player switched tracks, or went away (`track: None`).
    TrackChanged {
        track: Option<TrackMetadata>,
        playback: PlaybackSnapshot,
    },
    /// Play/pause flip or a seek on the current track.
    PlaybackChanged(PlaybackSnapshot),
    Command(Command),
    Resized { width: u16, height: u16 },
    /// A fetch finished. `generation` identifies which request it answers.
    LyricsFetched {
        generation: u64,
        candidates: CandidateSet,
    },
}

/// User requests, in full-screen mode mapped from key presses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Quit,
    Reload,
    CycleDocument(Cycle),
    Transport(Transport),
    /// Add this many seconds to the fix delay.
    ShiftDelay(f64),
}

/// Commands forwarded untouched to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    PlayPause,
    SkipNext,
    SkipPrevious,
}

impl From<Command> for SessionEvent {
    fn from(command: Command) -> Self {
        SessionEvent::Command(command)
    }
}
