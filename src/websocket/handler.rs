use actix::*;
use actix_web::web;
use actix_web_actors::ws;
use log::{debug, error, info, warn};

use crate::engine::channel::EngineOutput;
use crate::models::{ActiveSession, AppState, ClientMessage, ServerMessage};

/// One browser tab playing against the engine. The actor's mailbox is the
/// event loop: clicks, clock ticks and engine replies are handled one at a
/// time, so the session controller has a single writer.
pub struct GameSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub session: Option<ActiveSession>,
}

impl GameSocket {
    pub fn new(id: String, app_state: web::Data<AppState>) -> Self {
        Self {
            id,
            app_state,
            session: None,
        }
    }
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        let open = self.app_state.connection_opened();
        info!("WebSocket connection started: {}", self.id);
        info!("Open connections: {}", open);
    }

    fn stopping(&mut self, ctx: &mut Self::Context) -> Running {
        self.dispose_session(ctx);

        let open = self.app_state.connection_closed();
        info!("WebSocket connection closed: {}", self.id);
        info!("Open connections: {}", open);

        Running::Stop
    }
}

impl Handler<EngineOutput> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: EngineOutput, ctx: &mut Self::Context) {
        self.handle_engine_output(msg, ctx);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(ctx, &ServerMessage::error(None, format!("Invalid message format: {e}")));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(ctx, &ServerMessage::error(None, "Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                error!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

impl GameSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "new_game" => self.handle_new_game(msg, ctx),
            "click" => self.handle_click(msg, ctx),
            "promote" => self.handle_promote(msg, ctx),
            "resign" => self.handle_resign(ctx),
            "time_sync" => self.handle_time_sync(ctx),
            other => {
                info!("Unknown message type: {}", other);
                let session_id = self.session_id();
                self.send(ctx, &ServerMessage::error(session_id, format!("Unknown message type: {other}")));
            }
        }
    }

    pub fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize response: {}", e),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.id.to_string())
    }

    /// Stop the current session's ticker and drop it along with its engine.
    pub fn dispose_session(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(old) = self.session.take() {
            if let Some(ticker) = old.ticker {
                ctx.cancel_future(ticker);
            }
            info!("Disposed session {} on connection {}", old.id, self.id);
        }
    }
}
