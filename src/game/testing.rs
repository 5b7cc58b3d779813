//! Deterministic Move Authority for unit tests.

use std::collections::{HashMap, VecDeque};

use chess::{Color, Piece, Square};

use crate::error::ChessError;
use crate::game::authority::{MoveAuthority, PieceInfo};
use crate::game::move_token::{parse_square, MoveToken};

/// What the position looks like after the next applied move.
pub struct Frame {
    pub moves: Vec<&'static str>,
    pub in_check: bool,
}

impl Frame {
    pub fn new(moves: &[&'static str]) -> Self {
        Self {
            moves: moves.to_vec(),
            in_check: false,
        }
    }

    pub fn checked(mut self) -> Self {
        self.in_check = true;
        self
    }
}

pub struct ScriptedAuthority {
    pub to_move: Color,
    pub moves: Vec<MoveToken>,
    pub pieces: HashMap<Square, PieceInfo>,
    pub in_check: bool,
    pub history: Vec<MoveToken>,
    pub next: VecDeque<Frame>,
}

impl ScriptedAuthority {
    pub fn new(to_move: Color) -> Self {
        Self {
            to_move,
            moves: Vec::new(),
            pieces: HashMap::new(),
            in_check: false,
            history: Vec::new(),
            next: VecDeque::new(),
        }
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.moves = moves.iter().map(|m| MoveToken::parse(m).unwrap()).collect();
        self
    }

    pub fn with_piece(mut self, square: &str, kind: Piece, color: Color) -> Self {
        self.pieces
            .insert(parse_square(square).unwrap(), PieceInfo { kind, color });
        self
    }

    pub fn in_check(mut self) -> Self {
        self.in_check = true;
        self
    }

    pub fn then(mut self, frame: Frame) -> Self {
        self.next.push_back(frame);
        self
    }
}

impl MoveAuthority for ScriptedAuthority {
    fn color_to_move(&self) -> Color {
        self.to_move
    }

    fn legal_moves(&self) -> Vec<MoveToken> {
        self.moves.clone()
    }

    fn piece_at(&self, square: Square) -> Option<PieceInfo> {
        self.pieces.get(&square).copied()
    }

    fn apply_move(&mut self, token: &MoveToken) -> Result<(), ChessError> {
        if !self.moves.contains(token) {
            return Err(ChessError::IllegalMove(token.to_string()));
        }
        if let Some(piece) = self.pieces.remove(&token.origin()) {
            self.pieces.insert(token.destination(), piece);
        }
        self.history.push(*token);
        self.to_move = !self.to_move;
        let frame = self.next.pop_front().unwrap_or_else(|| Frame::new(&[]));
        self.moves = frame
            .moves
            .iter()
            .map(|m| MoveToken::parse(m).unwrap())
            .collect();
        self.in_check = frame.in_check;
        Ok(())
    }

    fn is_in_check(&self) -> bool {
        self.in_check
    }

    fn move_history(&self) -> Vec<MoveToken> {
        self.history.clone()
    }

    fn fen(&self) -> String {
        "scripted".to_string()
    }

    fn starting_fen(&self) -> Option<String> {
        None
    }
}
