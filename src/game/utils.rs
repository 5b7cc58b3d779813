use chess::{Color, Piece};

use crate::game::authority::MoveAuthority;
use crate::game::session::{SessionController, SessionState};

/// Convert a chess color to a string
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// Parse "white"/"black" (any case, or just the initial)
pub fn parse_color(value: &str) -> Option<Color> {
    match value.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Some(Color::White),
        "black" | "b" => Some(Color::Black),
        _ => None,
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// Get the game status as a string
pub fn game_status<A: MoveAuthority>(session: &SessionController<A>) -> String {
    match session.state() {
        SessionState::GameOver(outcome) => match outcome.winner {
            Some(Color::White) => "white_wins".to_string(),
            Some(Color::Black) => "black_wins".to_string(),
            None => "draw".to_string(),
        },
        SessionState::AwaitingEngine => "engine_thinking".to_string(),
        SessionState::AwaitingHuman => {
            if session.authority().is_in_check() {
                "check".to_string()
            } else {
                "your_turn".to_string()
            }
        }
    }
}
