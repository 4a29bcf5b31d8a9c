// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// STUN server URLs handed to clients via /api/turn
    pub stun_servers: Vec<String>,
    /// Optional operator-supplied TURN relay
    pub turn: Option<TurnSettings>,
}

/// TURN relay credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSettings {
    pub url: String,
    pub username: String,
    pub credential: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static addr"),
            log_level: "info".to_string(),
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
                "stun:stun2.l.google.com:19302".to_string(),
            ],
            turn: None,
        }
    }
}

impl Settings {
    /// Load settings: defaults, then `config.toml`, then `HUDDLE_`-prefixed
    /// environment variables (e.g. `HUDDLE_BIND_ADDR`).
    pub fn load() -> Result<Settings> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: &str) -> Result<Settings> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("HUDDLE_").split("__"))
            .extract()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr.port(), 3000);
        assert_eq!(settings.stun_servers.len(), 3);
        assert!(settings.turn.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.log_level, "info");
    }
}
