//! Turns square clicks into complete move tokens.
//!
//! First click picks an origin, second click a destination. When the pair
//! is shared by several promotion moves the resolver waits for a piece
//! choice before emitting anything. Re-selecting another piece inline is
//! not supported: a second click that is not a legal destination aborts.

use chess::{Color, Square};
use log::{debug, error};

use crate::error::ChessError;
use crate::game::authority::MoveAuthority;
use crate::game::move_token::{square_name, MoveToken, PromotionPiece};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolverState {
    #[default]
    Idle,
    Selected {
        origin: Square,
        destinations: Vec<Square>,
    },
    Promoting {
        origin: Square,
        destination: Square,
        options: Vec<PromotionPiece>,
    },
}

/// What a single click amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing happened.
    Ignored,
    /// An origin was accepted; `destinations` should be highlighted.
    Selected {
        origin: Square,
        destinations: Vec<Square>,
    },
    /// Origin and destination chosen, waiting for a promotion piece.
    PromotionChoice { options: Vec<PromotionPiece> },
    /// A complete move.
    Resolved(MoveToken),
    /// Selection dropped without a move.
    Aborted,
}

#[derive(Debug, Default)]
pub struct InputResolver {
    state: ResolverState,
}

impl InputResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = ResolverState::Idle;
    }

    /// Squares the UI should highlight for the pending selection.
    pub fn highlights(&self) -> Vec<Square> {
        match &self.state {
            ResolverState::Idle => Vec::new(),
            ResolverState::Selected {
                origin,
                destinations,
            } => std::iter::once(*origin)
                .chain(destinations.iter().copied())
                .collect(),
            ResolverState::Promoting {
                origin,
                destination,
                ..
            } => vec![*origin, *destination],
        }
    }

    pub fn click<A>(
        &mut self,
        square: Square,
        authority: &A,
        human: Color,
    ) -> Result<Resolution, ChessError>
    where
        A: MoveAuthority + ?Sized,
    {
        match std::mem::take(&mut self.state) {
            ResolverState::Idle => Ok(self.select_origin(square, authority, human)),
            ResolverState::Selected {
                origin,
                destinations,
            } => self.select_destination(origin, &destinations, square, authority),
            ResolverState::Promoting { .. } => {
                debug!("Promotion choice abandoned by click on {square}");
                Ok(Resolution::Aborted)
            }
        }
    }

    /// Finish a pending promotion. Letters that are not on offer are ignored
    /// and the choice stays open.
    pub fn choose_promotion(&mut self, piece: PromotionPiece) -> Option<MoveToken> {
        match &self.state {
            ResolverState::Promoting {
                origin,
                destination,
                options,
            } if options.contains(&piece) => {
                let token = MoveToken::new(*origin, *destination, Some(piece));
                self.state = ResolverState::Idle;
                Some(token)
            }
            ResolverState::Promoting { .. } => {
                debug!("Promotion to {} is not on offer", piece.letter());
                None
            }
            _ => {
                debug!("No promotion pending");
                None
            }
        }
    }

    fn select_origin<A>(&mut self, square: Square, authority: &A, human: Color) -> Resolution
    where
        A: MoveAuthority + ?Sized,
    {
        let owned = authority
            .piece_at(square)
            .is_some_and(|piece| piece.color == human);
        if !owned || authority.color_to_move() != human {
            return Resolution::Ignored;
        }

        let mut destinations: Vec<Square> = Vec::new();
        for mv in authority.legal_moves().iter().filter(|mv| mv.origin() == square) {
            if !destinations.contains(&mv.destination()) {
                destinations.push(mv.destination());
            }
        }

        if destinations.is_empty() {
            debug!("Piece on {} has no legal moves", square_name(square));
            return Resolution::Ignored;
        }

        self.state = ResolverState::Selected {
            origin: square,
            destinations: destinations.clone(),
        };
        Resolution::Selected {
            origin: square,
            destinations,
        }
    }

    fn select_destination<A>(
        &mut self,
        origin: Square,
        cached: &[Square],
        destination: Square,
        authority: &A,
    ) -> Result<Resolution, ChessError>
    where
        A: MoveAuthority + ?Sized,
    {
        let candidate = MoveToken::new(origin, destination, None);
        let matches: Vec<MoveToken> = authority
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.same_squares(&candidate))
            .collect();

        match matches.as_slice() {
            [] if cached.contains(&destination) => Err(inconsistent(
                format!("{} was highlighted but is no longer legal", candidate.prefix()),
            )),
            [] => Ok(Resolution::Aborted),
            [only] if only.promotion().is_none() => Ok(Resolution::Resolved(*only)),
            group if group.iter().all(|mv| mv.promotion().is_some()) => {
                let options: Vec<PromotionPiece> = PromotionPiece::ALL
                    .into_iter()
                    .filter(|piece| group.iter().any(|mv| mv.promotion() == Some(*piece)))
                    .collect();
                self.state = ResolverState::Promoting {
                    origin,
                    destination,
                    options: options.clone(),
                };
                Ok(Resolution::PromotionChoice { options })
            }
            group => Err(inconsistent(format!(
                "{} matches {} moves of mixed kinds",
                candidate.prefix(),
                group.len()
            ))),
        }
    }
}

fn inconsistent(detail: String) -> ChessError {
    error!("Input resolver out of sync: {detail}");
    ChessError::Inconsistent(detail)
}
