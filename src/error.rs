use crate::lyrics::LyricsError;
use crate::mpris::MprisError;
use thiserror::Error;

/// Failures that end the process.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Mpris(#[from] MprisError),
    #[error(transparent)]
    Lyrics(#[from] LyricsError),
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
