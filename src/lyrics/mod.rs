// lyrics/mod.rs - top-level lyrics module re-exporting submodules
pub mod parse;
pub mod providers;
pub mod similarity;
pub mod source;
pub mod types;

pub use providers::{LyricsProvider, LyricsQuery};
pub use source::LyricsSource;
pub use types::{CandidateSet, Cycle, LyricLine, LyricsDocument, LyricsError};
