//! One human-vs-engine game: whose turn it is, the clocks, game over, and
//! when to hand the position to the engine.

use std::fmt;
use std::time::{Duration, Instant};

use chess::{Color, Square};
use log::{debug, info, warn};

use crate::engine::protocol::{EngineReply, EngineRequest, StartPosition};
use crate::error::ChessError;
use crate::game::authority::MoveAuthority;
use crate::game::clock::Clock;
use crate::game::input::{InputResolver, Resolution, ResolverState};
use crate::game::move_token::{MoveToken, PromotionPiece};
use crate::game::utils::color_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Checkmate,
    Stalemate,
    Timeout,
    Resignation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    /// `None` for a draw.
    pub winner: Option<Color>,
    pub reason: EndReason,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            EndReason::Checkmate => "checkmate",
            EndReason::Stalemate => "stalemate",
            EndReason::Timeout => "time out",
            EndReason::Resignation => "resignation",
        };
        match self.winner {
            Some(color) => write!(f, "{} wins by {reason}", color_name(color)),
            None => write!(f, "draw by {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHuman,
    AwaitingEngine,
    GameOver(GameOutcome),
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub human: Color,
    pub initial_time: Duration,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub applied: MoveToken,
    pub mover: Color,
    /// Present when the engine is to move next.
    pub engine_request: Option<EngineRequest>,
    pub outcome: Option<GameOutcome>,
}

/// What a click or promotion choice led to, from the UI's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Ignored,
    Highlight(Vec<Square>),
    PromotionChoice(Vec<PromotionPiece>),
    Cleared,
    Moved(Transition),
    /// The move came too late: the flag fell first.
    GameOver(GameOutcome),
}

pub struct SessionController<A: MoveAuthority> {
    authority: A,
    clock: Clock,
    resolver: InputResolver,
    human: Color,
    state: SessionState,
}

impl<A: MoveAuthority> SessionController<A> {
    pub fn new(authority: A, settings: SessionSettings) -> (Self, Option<EngineRequest>) {
        Self::new_at(authority, settings, Instant::now())
    }

    /// Start the game at `now`. Returns the first engine request when the
    /// engine has the first move.
    pub fn new_at(
        authority: A,
        settings: SessionSettings,
        now: Instant,
    ) -> (Self, Option<EngineRequest>) {
        let to_move = authority.color_to_move();
        let mut clock = Clock::new(settings.initial_time, to_move);
        clock.start_at(now);

        let mut session = Self {
            authority,
            clock,
            resolver: InputResolver::new(),
            human: settings.human,
            state: SessionState::AwaitingHuman,
        };

        if let Some(outcome) = session.evaluate() {
            session.finish(outcome, now);
            return (session, None);
        }

        if to_move == session.human {
            (session, None)
        } else {
            session.state = SessionState::AwaitingEngine;
            let request = session.engine_request_at(now);
            (session, Some(request))
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.state {
            SessionState::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn highlights(&self) -> Vec<Square> {
        self.resolver.highlights()
    }

    pub fn resolver_state(&self) -> &ResolverState {
        self.resolver.state()
    }

    pub fn click(&mut self, square: Square) -> Interaction {
        self.click_at(square, Instant::now())
    }

    pub fn click_at(&mut self, square: Square, now: Instant) -> Interaction {
        if self.state != SessionState::AwaitingHuman {
            debug!("Click on {square} ignored in state {:?}", self.state);
            self.resolver.reset();
            return Interaction::Ignored;
        }

        match self.resolver.click(square, &self.authority, self.human) {
            Ok(Resolution::Ignored) => Interaction::Ignored,
            Ok(Resolution::Selected {
                origin,
                destinations,
            }) => {
                debug!("Selected {origin}, {} destinations", destinations.len());
                Interaction::Highlight(self.resolver.highlights())
            }
            Ok(Resolution::PromotionChoice { options }) => Interaction::PromotionChoice(options),
            Ok(Resolution::Aborted) => Interaction::Cleared,
            Ok(Resolution::Resolved(token)) => self.play_resolved(token, now),
            // already logged by the resolver
            Err(_) => Interaction::Cleared,
        }
    }

    pub fn choose_promotion(&mut self, piece: PromotionPiece) -> Interaction {
        self.choose_promotion_at(piece, Instant::now())
    }

    pub fn choose_promotion_at(&mut self, piece: PromotionPiece, now: Instant) -> Interaction {
        if self.state != SessionState::AwaitingHuman {
            self.resolver.reset();
            return Interaction::Ignored;
        }
        match self.resolver.choose_promotion(piece) {
            Some(token) => self.play_resolved(token, now),
            None => Interaction::Ignored,
        }
    }

    fn play_resolved(&mut self, token: MoveToken, now: Instant) -> Interaction {
        match self.submit_move_at(token, now) {
            Some(transition) => Interaction::Moved(transition),
            None => match self.outcome() {
                Some(outcome) => Interaction::GameOver(outcome),
                None => Interaction::Cleared,
            },
        }
    }

    pub fn submit_move(&mut self, token: MoveToken) -> Option<Transition> {
        self.submit_move_at(token, Instant::now())
    }

    /// Play a human move. Rejected (returns `None`, nothing changes) when it
    /// is not the human's turn or the move is illegal.
    pub fn submit_move_at(&mut self, token: MoveToken, now: Instant) -> Option<Transition> {
        if self.state != SessionState::AwaitingHuman {
            debug!("Move {token} rejected in state {:?}", self.state);
            return None;
        }
        self.resolver.reset();
        let transition = self.play_at(token, now).ok()?;
        info!("Player made move {token}");
        Some(transition)
    }

    pub fn engine_reply(&mut self, line: &str) -> Option<Transition> {
        self.engine_reply_at(line, Instant::now())
    }

    /// Apply the engine's answer to the last request.
    pub fn engine_reply_at(&mut self, line: &str, now: Instant) -> Option<Transition> {
        if self.state != SessionState::AwaitingEngine {
            warn!("Engine reply {line:?} arrived with no request outstanding, discarded");
            return None;
        }
        let token = match EngineReply::parse(line) {
            Ok(EngineReply::BestMove(token)) => token,
            Ok(other) => {
                warn!("Unexpected engine reply {other}, discarded");
                return None;
            }
            Err(e) => {
                warn!("{e}, discarded");
                return None;
            }
        };
        let token = match MoveToken::parse(&token) {
            Ok(token) => token,
            Err(e) => {
                warn!("Engine sent unusable move: {e}");
                return None;
            }
        };
        match self.play_at(token, now) {
            Ok(transition) => {
                info!("Engine made move {token}");
                Some(transition)
            }
            Err(e) => {
                warn!("Engine move rejected: {e}");
                None
            }
        }
    }

    pub fn tick(&mut self) -> Option<GameOutcome> {
        self.tick_at(Instant::now())
    }

    /// Poll the clocks. Ends the game when a flag has fallen.
    pub fn tick_at(&mut self, now: Instant) -> Option<GameOutcome> {
        if self.is_over() {
            return None;
        }
        let flagged = self.clock.flagged_at(now)?;
        let outcome = GameOutcome {
            winner: Some(!flagged),
            reason: EndReason::Timeout,
        };
        info!("{} ran out of time", color_name(flagged));
        self.finish(outcome, now);
        Some(outcome)
    }

    pub fn resign(&mut self) -> Option<GameOutcome> {
        self.resign_at(Instant::now())
    }

    pub fn resign_at(&mut self, now: Instant) -> Option<GameOutcome> {
        if self.is_over() {
            return None;
        }
        let outcome = GameOutcome {
            winner: Some(!self.human),
            reason: EndReason::Resignation,
        };
        self.finish(outcome, now);
        Some(outcome)
    }

    fn play_at(&mut self, token: MoveToken, now: Instant) -> Result<Transition, ChessError> {
        // a move made after the flag fell does not count
        if let Some(outcome) = self.tick_at(now) {
            return Err(ChessError::IllegalMove(format!("{token} after {outcome}")));
        }

        let mover = self.authority.color_to_move();
        self.authority.apply_move(&token).map_err(|e| {
            debug!("Rejected {token}: {e}");
            e
        })?;
        self.clock.toggle_at(now);

        if let Some(outcome) = self.evaluate() {
            self.finish(outcome, now);
            return Ok(Transition {
                applied: token,
                mover,
                engine_request: None,
                outcome: Some(outcome),
            });
        }

        let engine_request = if self.authority.color_to_move() == self.human {
            self.state = SessionState::AwaitingHuman;
            None
        } else {
            self.state = SessionState::AwaitingEngine;
            Some(self.engine_request_at(now))
        };

        Ok(Transition {
            applied: token,
            mover,
            engine_request,
            outcome: None,
        })
    }

    fn evaluate(&self) -> Option<GameOutcome> {
        if !self.authority.legal_moves().is_empty() {
            return None;
        }
        if self.authority.is_in_check() {
            Some(GameOutcome {
                winner: Some(!self.authority.color_to_move()),
                reason: EndReason::Checkmate,
            })
        } else {
            Some(GameOutcome {
                winner: None,
                reason: EndReason::Stalemate,
            })
        }
    }

    fn finish(&mut self, outcome: GameOutcome, now: Instant) {
        self.clock.stop_at(now);
        self.resolver.reset();
        self.state = SessionState::GameOver(outcome);
        info!("Game over: {outcome}");
    }

    fn engine_request_at(&self, now: Instant) -> EngineRequest {
        let start = match self.authority.starting_fen() {
            Some(fen) => StartPosition::Fen(fen),
            None => StartPosition::Standard,
        };
        EngineRequest::new(
            start,
            self.authority.move_history(),
            self.clock.remaining_ms_at(Color::White, now),
            self.clock.remaining_ms_at(Color::Black, now),
        )
    }
}
