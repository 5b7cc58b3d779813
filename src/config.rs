//! Server configuration from environment variables (and an optional `.env`).

use std::env;
use std::time::Duration;

use chess::Color;
use log::info;

use crate::error::ChessError;
use crate::game::utils::parse_color;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Directory served under `/static`
    pub static_dir: String,

    /// Think time each side starts with
    pub initial_time: Duration,

    /// How often the session host polls the clocks
    pub tick_interval: Duration,

    /// Color the human plays unless the client asks otherwise
    pub human_color: Color,

    /// Custom starting position; `None` means the standard one
    pub start_fen: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            static_dir: "./static".to_string(),
            initial_time: Duration::from_millis(600_000),
            tick_interval: Duration::from_millis(100),
            human_color: Color::White,
            start_fen: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ChessError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded environment from .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("CHESS_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let static_dir = lookup("CHESS_STATIC_DIR").unwrap_or(defaults.static_dir);

        let initial_time = match lookup("CHESS_INITIAL_TIME_MS") {
            Some(v) => Duration::from_millis(parse_number("CHESS_INITIAL_TIME_MS", &v)?),
            None => defaults.initial_time,
        };

        let tick_interval = match lookup("CHESS_TICK_MS") {
            Some(v) => {
                let ms = parse_number("CHESS_TICK_MS", &v)?;
                if ms == 0 {
                    return Err(ChessError::Config("CHESS_TICK_MS must be positive".into()));
                }
                Duration::from_millis(ms)
            }
            None => defaults.tick_interval,
        };

        let human_color = match lookup("CHESS_HUMAN_COLOR") {
            Some(v) => parse_color(&v)
                .ok_or_else(|| ChessError::Config(format!("CHESS_HUMAN_COLOR: unknown color {v:?}")))?,
            None => defaults.human_color,
        };

        let start_fen = lookup("CHESS_START_FEN").filter(|fen| !fen.trim().is_empty());

        Ok(Self {
            bind_addr,
            static_dir,
            initial_time,
            tick_interval,
            human_color,
            start_fen,
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ChessError> {
    value
        .trim()
        .parse()
        .map_err(|_| ChessError::Config(format!("{key}: expected a number, got {value:?}")))
}
