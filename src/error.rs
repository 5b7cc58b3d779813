use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move token: {0}")]
    InvalidMove(String),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Illegal move in current position: {0}")]
    IllegalMove(String),

    #[error("Input state out of sync with position: {0}")]
    Inconsistent(String),

    #[error("Engine protocol violation: {0}")]
    Protocol(String),

    #[error("Engine channel already has a request in flight")]
    ChannelBusy,

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
