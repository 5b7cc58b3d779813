//! Long-algebraic move tokens: `e2e4`, `e7e8q`.

use std::fmt;
use std::str::FromStr;

use chess::{File, Piece, Rank, Square};

use crate::error::ChessError;

/// Piece a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionPiece {
    /// Order in which promotion options are presented.
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    pub fn letter(self) -> char {
        match self {
            PromotionPiece::Queen => 'q',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Knight => 'n',
        }
    }

    /// Lowercase letters only, as they appear in move tokens.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'q' => Some(PromotionPiece::Queen),
            'r' => Some(PromotionPiece::Rook),
            'b' => Some(PromotionPiece::Bishop),
            'n' => Some(PromotionPiece::Knight),
            _ => None,
        }
    }

    pub fn piece(self) -> Piece {
        match self {
            PromotionPiece::Queen => Piece::Queen,
            PromotionPiece::Rook => Piece::Rook,
            PromotionPiece::Bishop => Piece::Bishop,
            PromotionPiece::Knight => Piece::Knight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveToken {
    origin: Square,
    destination: Square,
    promotion: Option<PromotionPiece>,
}

impl MoveToken {
    pub fn new(origin: Square, destination: Square, promotion: Option<PromotionPiece>) -> Self {
        Self {
            origin,
            destination,
            promotion,
        }
    }

    pub fn parse(text: &str) -> Result<Self, ChessError> {
        let text = text.trim();
        if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
            return Err(ChessError::InvalidMove(text.to_string()));
        }
        let origin = parse_square(&text[0..2]).map_err(|_| ChessError::InvalidMove(text.to_string()))?;
        let destination =
            parse_square(&text[2..4]).map_err(|_| ChessError::InvalidMove(text.to_string()))?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => Some(
                PromotionPiece::from_letter(c).ok_or_else(|| ChessError::InvalidMove(text.to_string()))?,
            ),
        };
        Ok(Self::new(origin, destination, promotion))
    }

    pub fn origin(&self) -> Square {
        self.origin
    }

    pub fn destination(&self) -> Square {
        self.destination
    }

    pub fn promotion(&self) -> Option<PromotionPiece> {
        self.promotion
    }

    /// Origin and destination only, the part a pair of clicks determines.
    pub fn prefix(&self) -> String {
        format!("{}{}", square_name(self.origin), square_name(self.destination))
    }

    pub fn same_squares(&self, other: &MoveToken) -> bool {
        self.origin == other.origin && self.destination == other.destination
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", square_name(self.origin), square_name(self.destination))?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.letter())?;
        }
        Ok(())
    }
}

impl FromStr for MoveToken {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveToken::parse(s)
    }
}

/// Parse a lowercase square id such as `e4`.
pub fn parse_square(text: &str) -> Result<Square, ChessError> {
    let mut chars = text.trim().chars();
    let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(ChessError::InvalidSquare(text.to_string()));
    };
    if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return Err(ChessError::InvalidSquare(text.to_string()));
    }
    Ok(Square::make_square(
        Rank::from_index(rank as usize - '1' as usize),
        File::from_index(file as usize - 'a' as usize),
    ))
}

pub fn square_name(square: Square) -> String {
    square.to_string()
}
