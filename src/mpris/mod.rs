//! MPRIS module: player discovery, observation and transport control.

pub mod connection;
pub mod events;
pub mod metadata;
pub mod playback;

pub use connection::MprisError;
pub use events::PlayerWatcher;
pub use metadata::TrackMetadata;
pub use playback::{MprisPlayer, PlayerControl};
