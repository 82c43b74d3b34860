//! D-Bus connection management and player discovery for MPRIS.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use zbus::proxy;

pub const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
pub const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYERCTLD: &str = "org.mpris.MediaPlayer2.playerctld";

#[derive(thiserror::Error, Debug)]
pub enum MprisError {
    #[error("D-Bus error: {0}")]
    ZBus(#[from] zbus::Error),
    #[error("Failed to establish D-Bus connection")]
    NoConnection,
}

impl From<zbus::fdo::Error> for MprisError {
    fn from(e: zbus::fdo::Error) -> Self {
        MprisError::ZBus(e.into())
    }
}

static DBUS_CONNECTION: OnceCell<Arc<zbus::Connection>> = OnceCell::const_new();

/// Get or create the shared D-Bus session connection.
pub async fn get_dbus_conn() -> Result<Arc<zbus::Connection>, MprisError> {
    DBUS_CONNECTION
        .get_or_try_init(|| async {
            let conn = zbus::Connection::session()
                .await
                .map_err(|_| MprisError::NoConnection)?;
            Ok(Arc::new(conn))
        })
        .await
        .cloned()
}

#[proxy(
    interface = "com.github.altdesktop.playerctld",
    default_service = "org.mpris.MediaPlayer2.playerctld",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait Playerctld {
    #[zbus(property)]
    fn player_names(&self) -> zbus::Result<Vec<String>>;
}

/// Active MPRIS player service names, most relevant first.
///
/// playerctld knows which player was used last, so its ordering is preferred.
/// Without it, every `org.mpris.MediaPlayer2.*` name on the bus is listed.
pub async fn get_active_player_names(conn: &zbus::Connection) -> Result<Vec<String>, MprisError> {
    if let Ok(proxy) = PlayerctldProxy::new(conn).await
        && let Ok(names) = proxy.player_names().await
    {
        return Ok(names);
    }

    debug!("playerctld unavailable, listing bus names");
    let dbus = zbus::fdo::DBusProxy::new(conn).await?;
    let names = dbus.list_names().await?;
    Ok(mpris_services(names.iter().map(|n| n.as_str())))
}

fn mpris_services<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut services: Vec<String> = names
        .filter(|n| n.starts_with(MPRIS_PREFIX) && *n != PLAYERCTLD)
        .map(str::to_string)
        .collect();
    services.sort();
    services
}

/// First service in `names` not matched by the block list.
pub fn pick_player<'a>(names: &'a [String], block_list: &[String]) -> Option<&'a str> {
    names
        .iter()
        .find(|s| !is_blocked(s, block_list))
        .map(String::as_str)
}

/// True if the service name (case-insensitive) contains any blocked string.
pub fn is_blocked(service: &str, block_list: &[String]) -> bool {
    let service_lower = service.to_lowercase();
    block_list
        .iter()
        .filter(|blocked| !blocked.trim().is_empty())
        .any(|blocked| service_lower.contains(&blocked.trim().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blocked_case_insensitive() {
        let block = vec!["Firefox".to_string(), "chromium".to_string()];
        assert!(is_blocked("org.mpris.MediaPlayer2.firefox.instance_1_12", &block));
        assert!(is_blocked("org.mpris.MediaPlayer2.Chromium", &block));
        assert!(!is_blocked("org.mpris.MediaPlayer2.spotify", &block));
    }

    #[test]
    fn test_empty_block_entries_ignored() {
        let block = vec!["".to_string(), "  ".to_string()];
        assert!(!is_blocked("org.mpris.MediaPlayer2.spotify", &block));
    }

    #[test]
    fn test_pick_player_skips_blocked() {
        let names = vec![
            "org.mpris.MediaPlayer2.firefox".to_string(),
            "org.mpris.MediaPlayer2.spotify".to_string(),
        ];
        let block = vec!["firefox".to_string()];
        assert_eq!(pick_player(&names, &block), Some("org.mpris.MediaPlayer2.spotify"));
        assert_eq!(pick_player(&names, &[]), Some("org.mpris.MediaPlayer2.firefox"));
        assert_eq!(pick_player(&[], &block), None);
    }

    #[test]
    fn test_mpris_services_filters_bus_names() {
        let names = [
            "org.freedesktop.DBus",
            ":1.42",
            "org.mpris.MediaPlayer2.vlc",
            "org.mpris.MediaPlayer2.playerctld",
            "org.mpris.MediaPlayer2.mpv",
        ];
        assert_eq!(
            mpris_services(names.into_iter()),
            vec!["org.mpris.MediaPlayer2.mpv", "org.mpris.MediaPlayer2.vlc"]
        );
    }
}
