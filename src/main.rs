mod error;
mod event;
mod lyrics;
mod mpris;
mod position;
mod scheduler;
mod session;
mod state;
mod text_utils;
mod timer;
mod ui;

use crate::error::AppError;
use crate::event::{Command, SessionEvent};
use crate::lyrics::LyricsSource;
use crate::mpris::{MprisPlayer, PlayerWatcher};
use crate::session::SessionCoordinator;
use crate::ui::styles::{HighlightColor, LyricStyles};
use crate::ui::terminal::{Screen, spawn_input_thread};
use crate::ui::view::Geometry;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PROVIDERS: [&str; 2] = ["lrclib", "musixmatch"];

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Color of the highlighted line
    #[arg(long, value_enum, default_value_t = HighlightColor::Cyan)]
    color: HighlightColor,
    /// Do not draw the highlighted line in bold
    #[arg(long = "no-bold")]
    no_bold: bool,
    /// Seconds subtracted from the player's position before picking a line (may be negative)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, value_name = "SECONDS")]
    fix_delay: f64,
    /// Pipe current lyric line to stdout instead of the full-screen UI
    #[arg(long)]
    pipe: bool,
    /// Blocklist for MPRIS player service names (comma-separated, case-insensitive)
    #[arg(
        long = "block",
        value_name = "SERVICE1,SERVICE2",
        value_delimiter = ','
    )]
    block: Vec<String>,
    /// Enable logging to stderr (filter with RUST_LOG)
    #[arg(long)]
    debug_log: bool,
    /// Comma-separated list of lyric providers to query (e.g. "lrclib,musixmatch").
    /// If empty, the LYRIC_PROVIDERS env var will be used as a fallback.
    #[arg(long, value_delimiter = ',')]
    providers: Vec<String>,
}

impl Config {
    fn validate(&self) -> Result<(), AppError> {
        if !self.fix_delay.is_finite() {
            return Err(AppError::InvalidConfig(format!(
                "--fix-delay must be a finite number of seconds, got {}",
                self.fix_delay
            )));
        }
        Ok(())
    }

    /// Providers from the command line, else `LYRIC_PROVIDERS`, else the defaults.
    fn provider_names(&self, env: Option<String>) -> Vec<String> {
        let from_cli = normalize_providers(self.providers.iter().map(String::as_str));
        if !from_cli.is_empty() {
            return from_cli;
        }
        if let Some(s) = env {
            let from_env = normalize_providers(s.split(','));
            if !from_env.is_empty() {
                return from_env;
            }
        }
        DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect()
    }
}

fn normalize_providers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    names
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lyrictui=debug")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = Config::parse();
    if cfg.debug_log {
        init_logging();
    }
    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config) -> Result<(), AppError> {
    cfg.validate()?;

    let client = lyrics::providers::http_client()?;
    let providers = lyrics::providers::from_names(
        &cfg.provider_names(std::env::var("LYRIC_PROVIDERS").ok()),
        &client,
    );
    let source = Arc::new(LyricsSource::new(providers));
    info!(providers = ?source.provider_names(), "lyrics providers");

    let screen = if cfg.pipe {
        None
    } else {
        Some(Screen::enter(LyricStyles::new(cfg.color, !cfg.no_bold))?)
    };
    let geometry = match &screen {
        Some(screen) => screen.geometry()?,
        None => Geometry::default(),
    };

    let (service_tx, service_rx) = watch::channel(None);
    let player = Arc::new(MprisPlayer::new(service_rx));
    let session = SessionCoordinator::new(source, player, cfg.fix_delay, geometry);

    // No D-Bus session means nothing to follow: fatal.
    let watcher = PlayerWatcher::new(session.events(), cfg.block.clone(), service_tx).await?;
    let watcher = tokio::spawn(async move {
        if let Err(e) = watcher.run().await {
            warn!(error = %e, "player watcher stopped");
        }
    });

    let render = session.subscribe();
    let result = match screen {
        Some(mut screen) => {
            spawn_input_thread(session.events());
            let session = tokio::spawn(session.run());
            let painted = screen.paint_until_closed(render).await;
            session.abort();
            painted
        }
        None => {
            let events = session.events();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = events.send(SessionEvent::Command(Command::Quit));
                }
            });
            let session = tokio::spawn(session.run());
            let printed = ui::pipe::run(render).await;
            session.abort();
            printed
        }
    };
    watcher.abort();
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("lyrictui").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&[]);
        assert_eq!(cfg.color, HighlightColor::Cyan);
        assert!(!cfg.no_bold);
        assert_eq!(cfg.fix_delay, 0.0);
        assert!(!cfg.pipe);
        assert_eq!(cfg.provider_names(None), vec!["lrclib", "musixmatch"]);
    }

    #[test]
    fn test_color_and_bold() {
        let cfg = parse(&["--color", "magenta", "--no-bold"]);
        assert_eq!(cfg.color, HighlightColor::Magenta);
        assert!(cfg.no_bold);
        assert!(Config::try_parse_from(["lyrictui", "--color", "purple"]).is_err());
    }

    #[test]
    fn test_negative_fix_delay() {
        let cfg = parse(&["--fix-delay", "-0.25"]);
        assert_eq!(cfg.fix_delay, -0.25);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_non_finite_fix_delay_rejected() {
        let cfg = parse(&["--fix-delay", "inf"]);
        assert!(matches!(cfg.validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_provider_precedence() {
        let cfg = parse(&["--providers", "Musixmatch, lrclib"]);
        assert_eq!(
            cfg.provider_names(Some("lrclib".into())),
            vec!["musixmatch", "lrclib"]
        );
        let cfg = parse(&[]);
        assert_eq!(cfg.provider_names(Some(" lrclib ,".into())), vec!["lrclib"]);
        assert_eq!(cfg.provider_names(Some(",".into())), vec!["lrclib", "musixmatch"]);
    }

    #[test]
    fn test_block_list() {
        let cfg = parse(&["--block", "firefox,chromium"]);
        assert_eq!(cfg.block, vec!["firefox", "chromium"]);
    }
}
