//! The background engine. Runs on its own `SyncArbiter` thread and answers
//! protocol lines one at a time, the way a UCI engine reads stdin.

use actix::prelude::*;
use chess::Piece;
use log::{debug, warn};
use rand::seq::SliceRandom;

use crate::engine::protocol::{EngineCommand, EngineReply, StartPosition, NULL_MOVE};
use crate::game::authority::{ChessAuthority, MoveAuthority};
use crate::game::move_token::MoveToken;

/// One protocol line for the engine. Resolves to the reply line, if any.
#[derive(Message, Debug, Clone)]
#[rtype(result = "Option<String>")]
pub struct Execute(pub String);

pub struct EngineWorker {
    position: ChessAuthority,
}

impl Default for EngineWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineWorker {
    pub fn new() -> Self {
        Self {
            position: ChessAuthority::standard(),
        }
    }

    pub fn execute(&mut self, line: &str) -> Option<String> {
        debug!("Received command '{line}'");
        let command = match line.parse::<EngineCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!("Engine ignoring line: {e}");
                return None;
            }
        };

        match command {
            EngineCommand::IsReady => Some(EngineReply::ReadyOk.to_string()),
            EngineCommand::Position { start, moves } => {
                self.set_position(start, &moves);
                None
            }
            EngineCommand::Go { wtime, btime } => {
                debug!("Searching with wtime {wtime} btime {btime}");
                let best = self
                    .best_move()
                    .map(|mv| mv.to_string())
                    .unwrap_or_else(|| NULL_MOVE.to_string());
                Some(EngineReply::BestMove(best).to_string())
            }
        }
    }

    fn set_position(&mut self, start: StartPosition, moves: &[MoveToken]) {
        let base = match start {
            StartPosition::Standard => Ok(ChessAuthority::standard()),
            StartPosition::Fen(fen) => ChessAuthority::from_fen(&fen),
        };
        let mut position = match base {
            Ok(position) => position,
            Err(e) => {
                warn!("Engine keeps previous position: {e}");
                return;
            }
        };
        for mv in moves {
            if let Err(e) = position.apply_move(mv) {
                warn!("Engine keeps previous position: {e}");
                return;
            }
        }
        self.position = position;
    }

    /// Greedy one-ply pick: biggest capture plus promotion gain, ties broken
    /// at random.
    fn best_move(&self) -> Option<MoveToken> {
        let moves = self.position.legal_moves();
        let score = |mv: &MoveToken| {
            let captured = self
                .position
                .piece_at(mv.destination())
                .map_or(0, |piece| piece_value(piece.kind));
            let promoted = mv.promotion().map_or(0, |p| piece_value(p.piece()) - 1);
            captured + promoted
        };
        let best_score = moves.iter().map(score).max()?;
        let best: Vec<MoveToken> = moves.into_iter().filter(|mv| score(mv) == best_score).collect();
        best.choose(&mut rand::thread_rng()).copied()
    }
}

fn piece_value(piece: Piece) -> u32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight | Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

impl Actor for EngineWorker {
    type Context = SyncContext<Self>;
}

impl Handler<Execute> for EngineWorker {
    type Result = Option<String>;

    fn handle(&mut self, msg: Execute, _: &mut Self::Context) -> Self::Result {
        self.execute(&msg.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bestmove(reply: Option<String>) -> MoveToken {
        let reply = reply.expect("go must be answered");
        match EngineReply::parse(&reply).unwrap() {
            EngineReply::BestMove(token) => MoveToken::parse(&token).unwrap(),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn answers_isready() {
        let mut worker = EngineWorker::new();
        assert_eq!(worker.execute("isready").as_deref(), Some("readyok"));
    }

    #[test]
    fn position_is_silent_and_go_answers_a_legal_move() {
        let mut worker = EngineWorker::new();
        assert_eq!(worker.execute("position startpos moves d2d4"), None);
        let mv = bestmove(worker.execute("go wtime 58766 btime 60000"));

        let mut check = ChessAuthority::standard();
        check.apply_move(&MoveToken::parse("d2d4").unwrap()).unwrap();
        assert!(check.legal_moves().contains(&mv));
    }

    #[test]
    fn takes_the_hanging_queen() {
        let mut worker = EngineWorker::new();
        worker.execute("position fen 4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1");
        let mv = bestmove(worker.execute("go wtime 1000 btime 1000"));
        assert_eq!(mv.to_string(), "e4d5");
    }

    #[test]
    fn promotes_to_a_queen() {
        let mut worker = EngineWorker::new();
        worker.execute("position fen 7k/P7/8/8/8/8/8/K7 w - - 0 1");
        let mv = bestmove(worker.execute("go wtime 1000 btime 1000"));
        assert_eq!(mv.to_string(), "a7a8q");
    }

    #[test]
    fn reports_null_move_without_legal_moves() {
        let mut worker = EngineWorker::new();
        worker.execute("position startpos moves f2f3 e7e5 g2g4 d8h4");
        assert_eq!(
            worker.execute("go wtime 1 btime 1").as_deref(),
            Some("bestmove 0000")
        );
    }

    #[test]
    fn bad_lines_are_ignored() {
        let mut worker = EngineWorker::new();
        assert_eq!(worker.execute("uci"), None);
        assert_eq!(worker.execute("position startpos moves e2e5"), None);
        // previous position kept: still the standard one
        let mv = bestmove(worker.execute("go wtime 1 btime 1"));
        assert!(ChessAuthority::standard().legal_moves().contains(&mv));
    }
}
