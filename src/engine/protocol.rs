//! Text protocol spoken across the engine channel.
//!
//! Outgoing: `isready`, `position startpos [moves ...]`,
//! `position fen <fen> [moves ...]`, `go wtime <ms> btime <ms>`.
//! Incoming: `readyok`, `bestmove <token>`.

use std::fmt;
use std::str::FromStr;

use crate::error::ChessError;
use crate::game::move_token::MoveToken;

/// Marker in front of the engine's chosen move.
pub const BESTMOVE_PREFIX: &str = "bestmove ";

/// Move the engine reports when it has nothing legal to play.
pub const NULL_MOVE: &str = "0000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    IsReady,
    Position {
        start: StartPosition,
        moves: Vec<MoveToken>,
    },
    Go {
        wtime: u64,
        btime: u64,
    },
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::IsReady => write!(f, "isready"),
            EngineCommand::Position { start, moves } => {
                match start {
                    StartPosition::Standard => write!(f, "position startpos")?,
                    StartPosition::Fen(fen) => write!(f, "position fen {fen}")?,
                }
                if !moves.is_empty() {
                    write!(f, " moves")?;
                    for mv in moves {
                        write!(f, " {mv}")?;
                    }
                }
                Ok(())
            }
            EngineCommand::Go { wtime, btime } => write!(f, "go wtime {wtime} btime {btime}"),
        }
    }
}

impl FromStr for EngineCommand {
    type Err = ChessError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("isready") => Ok(EngineCommand::IsReady),
            Some("position") => parse_position(words.collect()),
            Some("go") => parse_go(words.collect()),
            _ => Err(ChessError::Protocol(format!("unknown command: {line:?}"))),
        }
    }
}

fn parse_position(words: Vec<&str>) -> Result<EngineCommand, ChessError> {
    let split = words.iter().position(|w| *w == "moves").unwrap_or(words.len());
    let (head, tail) = words.split_at(split);

    let start = match head {
        ["startpos"] => StartPosition::Standard,
        ["fen", fen @ ..] if !fen.is_empty() => StartPosition::Fen(fen.join(" ")),
        _ => {
            return Err(ChessError::Protocol(format!(
                "bad position command: {}",
                words.join(" ")
            )))
        }
    };

    let moves = tail
        .iter()
        .skip(1)
        .map(|w| MoveToken::parse(w))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ChessError::Protocol(format!("bad move list: {e}")))?;

    Ok(EngineCommand::Position { start, moves })
}

fn parse_go(words: Vec<&str>) -> Result<EngineCommand, ChessError> {
    let mut wtime = None;
    let mut btime = None;
    let mut iter = words.iter();
    while let Some(key) = iter.next() {
        match *key {
            "wtime" => wtime = iter.next().and_then(|v| v.parse::<u64>().ok()),
            "btime" => btime = iter.next().and_then(|v| v.parse::<u64>().ok()),
            _ => {}
        }
    }
    match (wtime, btime) {
        (Some(wtime), Some(btime)) => Ok(EngineCommand::Go { wtime, btime }),
        _ => Err(ChessError::Protocol(format!(
            "go needs wtime and btime: {}",
            words.join(" ")
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    ReadyOk,
    BestMove(String),
}

impl EngineReply {
    pub fn parse(line: &str) -> Result<Self, ChessError> {
        let line = line.trim_end();
        if line == "readyok" {
            return Ok(EngineReply::ReadyOk);
        }
        match line
            .strip_prefix(BESTMOVE_PREFIX)
            .and_then(|rest| rest.split_whitespace().next())
        {
            Some(token) => Ok(EngineReply::BestMove(token.to_string())),
            None => Err(ChessError::Protocol(format!("unrecognized reply: {line:?}"))),
        }
    }
}

impl fmt::Display for EngineReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineReply::ReadyOk => write!(f, "readyok"),
            EngineReply::BestMove(token) => write!(f, "{BESTMOVE_PREFIX}{token}"),
        }
    }
}

/// What the controller hands the engine on each turn: where the game
/// stands, then how much time both sides have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub position: EngineCommand,
    pub go: EngineCommand,
}

impl EngineRequest {
    pub fn new(start: StartPosition, moves: Vec<MoveToken>, wtime: u64, btime: u64) -> Self {
        Self {
            position: EngineCommand::Position { start, moves },
            go: EngineCommand::Go { wtime, btime },
        }
    }

    /// Wire lines in send order.
    pub fn lines(&self) -> [String; 2] {
        [self.position.to_string(), self.go.to_string()]
    }
}
