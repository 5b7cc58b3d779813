use serde::{Deserialize, Serialize};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClientMessage {
    pub message_type: String,
    pub color: Option<String>,
    pub time_ms: Option<u64>,
    pub fen: Option<String>,
    pub square: Option<String>,
    pub piece: Option<String>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_to_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_piece: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn new(message_type: &str) -> Self {
        Self {
            message_type: message_type.to_string(),
            ..Default::default()
        }
    }

    pub fn error(session_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            session_id,
            error: Some(error.into()),
            ..Self::new("error")
        }
    }
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
    pub color: String,
    #[serde(rename = "move")]
    pub token: String,
}
