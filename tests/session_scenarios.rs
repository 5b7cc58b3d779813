use std::time::{Duration, Instant};

use actix::prelude::*;
use chess::{Color, Square};
use futures::channel::mpsc;
use futures::StreamExt;
use uuid::Uuid;

use chess_engine_web::engine::channel::{EngineChannel, EngineOutput, Submit};
use chess_engine_web::engine::protocol::{EngineCommand, StartPosition};
use chess_engine_web::game::authority::{ChessAuthority, MoveAuthority};
use chess_engine_web::game::move_token::{parse_square, MoveToken, PromotionPiece};
use chess_engine_web::game::session::{
    EndReason, GameOutcome, Interaction, SessionController, SessionSettings, SessionState,
};

fn sq(name: &str) -> Square {
    parse_square(name).unwrap()
}

fn settings(human: Color, secs: u64) -> SessionSettings {
    SessionSettings {
        human,
        initial_time: Duration::from_secs(secs),
    }
}

#[test]
fn first_human_move_hands_elapsed_time_to_the_engine() {
    let start = Instant::now();
    let (mut session, first) =
        SessionController::new_at(ChessAuthority::standard(), settings(Color::White, 60), start);
    assert!(first.is_none());

    let later = start + Duration::from_millis(1234);
    assert!(matches!(
        session.click_at(sq("d2"), later),
        Interaction::Highlight(_)
    ));
    let transition = match session.click_at(sq("d4"), later) {
        Interaction::Moved(transition) => transition,
        other => panic!("expected a move, got {other:?}"),
    };

    assert_eq!(transition.applied.to_string(), "d2d4");
    assert_eq!(transition.mover, Color::White);
    let request = transition.engine_request.unwrap();
    assert_eq!(
        request.lines(),
        [
            "position startpos moves d2d4".to_string(),
            "go wtime 58766 btime 60000".to_string()
        ]
    );
    assert_eq!(session.state(), SessionState::AwaitingEngine);
    assert_eq!(session.clock().turn(), Color::Black);
}

#[test]
fn engine_moves_first_when_human_takes_black() {
    let start = Instant::now();
    let (session, first) =
        SessionController::new_at(ChessAuthority::standard(), settings(Color::Black, 60), start);

    let request = first.unwrap();
    assert_eq!(
        request.lines(),
        [
            "position startpos".to_string(),
            "go wtime 60000 btime 60000".to_string()
        ]
    );
    assert_eq!(session.state(), SessionState::AwaitingEngine);
}

#[test]
fn flag_falls_at_exactly_zero() {
    let start = Instant::now();
    let (mut session, _) =
        SessionController::new_at(ChessAuthority::standard(), settings(Color::White, 1), start);

    assert_eq!(session.tick_at(start + Duration::from_millis(999)), None);
    let outcome = session.tick_at(start + Duration::from_secs(1)).unwrap();
    assert_eq!(
        outcome,
        GameOutcome {
            winner: Some(Color::Black),
            reason: EndReason::Timeout
        }
    );
    assert!(!session.clock().is_running());

    // nothing is accepted after the flag
    let late = start + Duration::from_secs(2);
    assert_eq!(session.click_at(sq("e2"), late), Interaction::Ignored);
    assert!(session
        .submit_move_at(MoveToken::parse("e2e4").unwrap(), late)
        .is_none());
}

#[test]
fn promotion_is_chosen_after_two_clicks() {
    let start = Instant::now();
    let authority = ChessAuthority::from_fen("8/P7/8/8/8/8/8/k6K w - - 0 1").unwrap();
    let (mut session, _) = SessionController::new_at(authority, settings(Color::White, 60), start);

    assert_eq!(
        session.click_at(sq("a7"), start),
        Interaction::Highlight(vec![sq("a7"), sq("a8")])
    );
    assert_eq!(
        session.click_at(sq("a8"), start),
        Interaction::PromotionChoice(PromotionPiece::ALL.to_vec())
    );

    let transition = match session.choose_promotion_at(PromotionPiece::Knight, start) {
        Interaction::Moved(transition) => transition,
        other => panic!("expected a move, got {other:?}"),
    };
    assert_eq!(transition.applied.to_string(), "a7a8n");

    let request = transition.engine_request.unwrap();
    match &request.position {
        EngineCommand::Position {
            start: StartPosition::Fen(fen),
            moves,
        } => {
            assert!(fen.starts_with("8/P7/8/8/8/8/8/k6K w"));
            assert_eq!(moves, &vec![MoveToken::parse("a7a8n").unwrap()]);
        }
        other => panic!("expected a fen position, got {other:?}"),
    }
    assert!(request.lines()[0].ends_with(" moves a7a8n"));
}

#[test]
fn engine_delivers_fools_mate() {
    let start = Instant::now();
    let (mut session, _) =
        SessionController::new_at(ChessAuthority::standard(), settings(Color::White, 60), start);

    let at = |ms| start + Duration::from_millis(ms);
    session
        .submit_move_at(MoveToken::parse("f2f3").unwrap(), at(100))
        .unwrap();
    session.engine_reply_at("bestmove e7e5", at(200)).unwrap();
    session
        .submit_move_at(MoveToken::parse("g2g4").unwrap(), at(300))
        .unwrap();
    let transition = session.engine_reply_at("bestmove d8h4", at(400)).unwrap();

    let outcome = GameOutcome {
        winner: Some(Color::Black),
        reason: EndReason::Checkmate,
    };
    assert_eq!(transition.outcome, Some(outcome));
    assert!(transition.engine_request.is_none());
    assert_eq!(session.state(), SessionState::GameOver(outcome));
    assert_eq!(outcome.to_string(), "black wins by checkmate");
}

#[test]
fn engine_reply_while_waiting_on_human_is_dropped() {
    let (mut session, _) =
        SessionController::new(ChessAuthority::standard(), settings(Color::White, 60));
    assert!(session.engine_reply("bestmove e7e5").is_none());
    assert!(session.authority().move_history().is_empty());
    assert_eq!(session.state(), SessionState::AwaitingHuman);
}

struct Collector(mpsc::UnboundedSender<EngineOutput>);

impl Actor for Collector {
    type Context = Context<Self>;
}

impl Handler<EngineOutput> for Collector {
    type Result = ();

    fn handle(&mut self, msg: EngineOutput, _: &mut Self::Context) {
        let _ = self.0.unbounded_send(msg);
    }
}

#[actix_rt::test]
async fn session_and_engine_play_a_few_moves() {
    let (tx, mut rx) = mpsc::unbounded();
    let collector = Collector(tx).start();
    let engine = EngineChannel::spawn(collector.recipient());
    let session_id = Uuid::new_v4();

    let (mut session, _) =
        SessionController::new(ChessAuthority::standard(), settings(Color::White, 600));

    for (from, to) in [("e2", "e4"), ("d2", "d4")] {
        session.click(sq(from));
        let transition = match session.click(sq(to)) {
            Interaction::Moved(transition) => transition,
            other => panic!("expected a move, got {other:?}"),
        };
        let request = transition.engine_request.unwrap();
        engine
            .send(Submit {
                session_id,
                request,
            })
            .await
            .unwrap()
            .unwrap();

        let output = rx.next().await.unwrap();
        assert_eq!(output.session_id, session_id);
        let line = output.result.unwrap();
        let reply = session.engine_reply(&line).unwrap();
        assert_eq!(reply.mover, Color::Black);
        assert_eq!(session.state(), SessionState::AwaitingHuman);
    }
    assert_eq!(session.authority().move_history().len(), 4);
}
