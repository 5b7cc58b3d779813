//! The Move Authority: everything the session needs to know about the
//! position, behind a trait so the rules backend can be swapped out.

use std::str::FromStr;

use chess::{Board, ChessMove, Color, Game, MoveGen, Piece, Square};
use log::debug;

use crate::error::ChessError;
use crate::game::move_token::{MoveToken, PromotionPiece};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceInfo {
    pub kind: Piece,
    pub color: Color,
}

pub trait MoveAuthority {
    fn color_to_move(&self) -> Color;

    /// Legal moves in the current position, recomputed on every call.
    fn legal_moves(&self) -> Vec<MoveToken>;

    fn piece_at(&self, square: Square) -> Option<PieceInfo>;

    /// Play `token`. Fails without touching the position if it is not legal.
    fn apply_move(&mut self, token: &MoveToken) -> Result<(), ChessError>;

    fn is_in_check(&self) -> bool;

    /// Moves played since the starting position, oldest first.
    fn move_history(&self) -> Vec<MoveToken>;

    /// FEN of the current position.
    fn fen(&self) -> String;

    /// FEN the game started from, `None` for the standard starting position.
    fn starting_fen(&self) -> Option<String>;
}

/// Move Authority backed by the `chess` crate.
#[derive(Clone)]
pub struct ChessAuthority {
    game: Game,
    history: Vec<MoveToken>,
    starting_fen: Option<String>,
}

impl ChessAuthority {
    pub fn standard() -> Self {
        Self {
            game: Game::new(),
            history: Vec::new(),
            starting_fen: None,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let board = Board::from_str(fen.trim())
            .map_err(|e| ChessError::InvalidPosition(format!("{fen}: {e:?}")))?;
        let normalized = board.to_string();
        let starting_fen = if normalized == Board::default().to_string() {
            None
        } else {
            Some(normalized)
        };
        Ok(Self {
            game: Game::new_with_board(board),
            history: Vec::new(),
            starting_fen,
        })
    }

    fn board(&self) -> Board {
        self.game.current_position()
    }

    fn find_legal(&self, token: &MoveToken) -> Option<ChessMove> {
        MoveGen::new_legal(&self.board()).find(|mv| to_token(*mv) == *token)
    }
}

impl Default for ChessAuthority {
    fn default() -> Self {
        Self::standard()
    }
}

impl MoveAuthority for ChessAuthority {
    fn color_to_move(&self) -> Color {
        self.game.side_to_move()
    }

    fn legal_moves(&self) -> Vec<MoveToken> {
        MoveGen::new_legal(&self.board()).map(to_token).collect()
    }

    fn piece_at(&self, square: Square) -> Option<PieceInfo> {
        let board = self.board();
        let kind = board.piece_on(square)?;
        let color = board.color_on(square)?;
        Some(PieceInfo { kind, color })
    }

    fn apply_move(&mut self, token: &MoveToken) -> Result<(), ChessError> {
        let chess_move = self
            .find_legal(token)
            .ok_or_else(|| ChessError::IllegalMove(token.to_string()))?;
        if !self.game.make_move(chess_move) {
            return Err(ChessError::IllegalMove(token.to_string()));
        }
        debug!("Applied {token}, position now {}", self.board());
        self.history.push(*token);
        Ok(())
    }

    fn is_in_check(&self) -> bool {
        self.board().checkers().popcnt() > 0
    }

    fn move_history(&self) -> Vec<MoveToken> {
        self.history.clone()
    }

    fn fen(&self) -> String {
        self.board().to_string()
    }

    fn starting_fen(&self) -> Option<String> {
        self.starting_fen.clone()
    }
}

fn to_token(chess_move: ChessMove) -> MoveToken {
    let promotion = chess_move.get_promotion().and_then(|piece| match piece {
        Piece::Queen => Some(PromotionPiece::Queen),
        Piece::Rook => Some(PromotionPiece::Rook),
        Piece::Bishop => Some(PromotionPiece::Bishop),
        Piece::Knight => Some(PromotionPiece::Knight),
        _ => None,
    });
    MoveToken::new(chess_move.get_source(), chess_move.get_dest(), promotion)
}
