use actix::prelude::*;
use actix_web_actors::ws;
use log::{debug, error, info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::engine::channel::{EngineChannel, EngineOutput, Submit};
use crate::engine::protocol::EngineRequest;
use crate::error::ChessError;
use crate::game::authority::{ChessAuthority, MoveAuthority};
use crate::game::clock::format_clock;
use crate::game::input::ResolverState;
use crate::game::move_token::{parse_square, square_name, PromotionPiece};
use crate::game::session::{
    GameOutcome, Interaction, SessionController, SessionSettings, Transition,
};
use crate::game::utils::{color_name, game_status, parse_color, piece_name};
use crate::models::{ActiveSession, ClientMessage, LastMove, ServerMessage};
use crate::websocket::handler::GameSocket;

impl GameSocket {
    pub fn handle_new_game(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let config = &self.app_state.config;

        let human = match msg.color.as_deref() {
            Some(value) => match parse_color(value) {
                Some(color) => color,
                None => {
                    self.send(ctx, &ServerMessage::error(None, format!("Invalid color: {value}")));
                    return;
                }
            },
            None => config.human_color,
        };
        let initial_time = msg
            .time_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(config.initial_time);

        let authority = match msg.fen.as_deref().or(config.start_fen.as_deref()) {
            Some(fen) => match ChessAuthority::from_fen(fen) {
                Ok(authority) => authority,
                Err(e) => {
                    warn!("Refusing new game: {}", e);
                    self.send(ctx, &ServerMessage::error(None, e.to_string()));
                    return;
                }
            },
            None => ChessAuthority::standard(),
        };
        let tick_interval = config.tick_interval;

        self.dispose_session(ctx);

        let id = Uuid::new_v4();
        let engine = EngineChannel::spawn(ctx.address().recipient());
        let (controller, first_request) =
            SessionController::new(authority, SessionSettings { human, initial_time });
        info!(
            "Session {} started on {}: human plays {}, {} ms each",
            id,
            self.id,
            color_name(human),
            initial_time.as_millis()
        );

        let ticker = if controller.is_over() {
            None
        } else {
            Some(ctx.run_interval(tick_interval, |act, ctx| act.on_tick(ctx)))
        };
        self.session = Some(ActiveSession {
            id,
            controller,
            engine,
            ticker,
        });

        let started = self.snapshot("game_started");
        self.send(ctx, &started);

        if let Some(outcome) = self.session.as_ref().and_then(|s| s.controller.outcome()) {
            self.announce_game_over(outcome, ctx);
        } else if let Some(request) = first_request {
            self.submit(request, ctx);
        }
    }

    pub fn handle_click(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let square = match msg.square.map(|s| parse_square(&s.to_ascii_lowercase())) {
            Some(Ok(square)) => square,
            Some(Err(e)) => {
                self.send(ctx, &ServerMessage::error(self.session_id(), e.to_string()));
                return;
            }
            None => {
                self.send(ctx, &ServerMessage::error(self.session_id(), "Missing square"));
                return;
            }
        };

        let Some(session) = self.session.as_mut() else {
            self.send(ctx, &ServerMessage::error(None, "No game in progress"));
            return;
        };
        let interaction = session.controller.click(square);
        self.present(interaction, ctx);
    }

    pub fn handle_promote(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let piece = msg
            .piece
            .as_deref()
            .and_then(|p| p.chars().next())
            .and_then(|c| PromotionPiece::from_letter(c.to_ascii_lowercase()));
        let Some(piece) = piece else {
            self.send(ctx, &ServerMessage::error(self.session_id(), "Invalid promotion piece"));
            return;
        };

        let Some(session) = self.session.as_mut() else {
            self.send(ctx, &ServerMessage::error(None, "No game in progress"));
            return;
        };
        let interaction = session.controller.choose_promotion(piece);
        self.present(interaction, ctx);
    }

    pub fn handle_resign(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            self.send(ctx, &ServerMessage::error(None, "No game in progress"));
            return;
        };
        match session.controller.resign() {
            Some(outcome) => self.announce_game_over(outcome, ctx),
            None => self.send(ctx, &ServerMessage::error(self.session_id(), "Game is already over")),
        }
    }

    pub fn handle_time_sync(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session.is_none() {
            self.send(ctx, &ServerMessage::error(None, "No game in progress"));
            return;
        }
        let clock = self.snapshot("clock");
        self.send(ctx, &clock);
    }

    pub fn handle_engine_output(&mut self, msg: EngineOutput, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            debug!("Engine output for {} with no session, discarded", msg.session_id);
            return;
        };
        if session.id != msg.session_id {
            debug!("Stale engine output for {}, discarded", msg.session_id);
            return;
        }

        match msg.result {
            Ok(line) => {
                debug!("Engine replied: {}", line);
                match session.controller.engine_reply(&line) {
                    Some(transition) => self.after_transition(transition, ctx),
                    // the reply may have come after the engine's flag fell
                    None => self.announce_if_over(ctx),
                }
            }
            Err(e) => {
                error!("Engine failed for session {}: {}", msg.session_id, e);
                self.send(ctx, &ServerMessage::error(self.session_id(), e.to_string()));
            }
        }
    }

    fn on_tick(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let flag_fall = session.controller.tick();

        let clock = self.snapshot("clock");
        self.send(ctx, &clock);

        if let Some(outcome) = flag_fall {
            self.announce_game_over(outcome, ctx);
        }
    }

    fn present(&mut self, interaction: Interaction, ctx: &mut ws::WebsocketContext<Self>) {
        match interaction {
            Interaction::Ignored => {}
            Interaction::Highlight(_) | Interaction::Cleared => {
                let selection = self.snapshot("selection");
                self.send(ctx, &selection);
            }
            Interaction::PromotionChoice(options) => {
                let choice = ServerMessage {
                    promotion_options: Some(
                        options.iter().map(|p| p.letter().to_string()).collect(),
                    ),
                    ..self.snapshot("promotion_choice")
                };
                self.send(ctx, &choice);
            }
            Interaction::Moved(transition) => self.after_transition(transition, ctx),
            Interaction::GameOver(outcome) => self.announce_game_over(outcome, ctx),
        }
    }

    fn after_transition(&mut self, transition: Transition, ctx: &mut ws::WebsocketContext<Self>) {
        let token = transition.applied;
        let moved = ServerMessage {
            last_move: Some(LastMove {
                from: square_name(token.origin()),
                to: square_name(token.destination()),
                promotion: token.promotion().map(|p| p.letter().to_string()),
                color: color_name(transition.mover).to_string(),
                token: token.to_string(),
            }),
            ..self.snapshot("move_made")
        };
        self.send(ctx, &moved);

        if let Some(outcome) = transition.outcome {
            self.announce_game_over(outcome, ctx);
        } else if let Some(request) = transition.engine_request {
            self.submit(request, ctx);
        }
    }

    /// Announce an outcome the ticker has not reported yet.
    fn announce_if_over(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let pending = self
            .session
            .as_ref()
            .filter(|s| s.ticker.is_some())
            .and_then(|s| s.controller.outcome());
        if let Some(outcome) = pending {
            self.announce_game_over(outcome, ctx);
        }
    }

    fn announce_game_over(&mut self, outcome: GameOutcome, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(ticker) = self.session.as_mut().and_then(|s| s.ticker.take()) {
            ctx.cancel_future(ticker);
        }
        info!("Session on {} over: {}", self.id, outcome);
        let over = ServerMessage {
            result: Some(outcome.to_string()),
            ..self.snapshot("game_over")
        };
        self.send(ctx, &over);
    }

    fn submit(&mut self, request: EngineRequest, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let session_id = session.id;
        let submit = session.engine.send(Submit {
            session_id,
            request,
        });

        let fut = submit.into_actor(self).map(move |res, act, ctx| {
            let failure = match res {
                Ok(Ok(())) => return,
                Ok(Err(ChessError::ChannelBusy)) => {
                    error!("Engine request for {} while another is in flight", session_id);
                    ChessError::ChannelBusy
                }
                Ok(Err(e)) => e,
                Err(e) => ChessError::EngineUnavailable(e.to_string()),
            };
            if act.session.as_ref().map(|s| s.id) == Some(session_id) {
                warn!("Engine request failed: {}", failure);
                act.send(ctx, &ServerMessage::error(Some(session_id.to_string()), failure.to_string()));
            }
        });
        ctx.spawn(fut);
    }

    /// Message of the given type filled in with the current session's view.
    fn snapshot(&self, message_type: &str) -> ServerMessage {
        let Some(session) = self.session.as_ref() else {
            return ServerMessage::new(message_type);
        };
        let controller = &session.controller;
        let authority = controller.authority();
        let clock = controller.clock();
        let white = clock.remaining(chess::Color::White);
        let black = clock.remaining(chess::Color::Black);

        let selected_piece = selected_origin(controller)
            .and_then(|square| authority.piece_at(square))
            .map(|info| piece_name(info.kind).to_string());

        ServerMessage {
            session_id: Some(session.id.to_string()),
            fen: Some(authority.fen()),
            human_color: Some(color_name(controller.human()).to_string()),
            color_to_move: Some(color_name(authority.color_to_move()).to_string()),
            highlights: Some(controller.highlights().into_iter().map(square_name).collect()),
            selected_piece,
            game_status: Some(game_status(controller)),
            white_time_ms: Some(white.as_millis() as u64),
            black_time_ms: Some(black.as_millis() as u64),
            white_clock: Some(format_clock(white)),
            black_clock: Some(format_clock(black)),
            ..ServerMessage::new(message_type)
        }
    }
}

fn selected_origin(controller: &SessionController<ChessAuthority>) -> Option<chess::Square> {
    match controller.resolver_state() {
        ResolverState::Selected { origin, .. } | ResolverState::Promoting { origin, .. } => {
            Some(*origin)
        }
        ResolverState::Idle => None,
    }
}
