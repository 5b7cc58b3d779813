//! Ordered, single-outstanding-request channel to the engine worker.
//!
//! The channel asks the worker `isready` as soon as it starts and holds
//! back the first request until `readyok` comes back. After that exactly
//! one request may be in flight; a second one is refused with
//! [`ChessError::ChannelBusy`] instead of being matched to the wrong reply.

use actix::prelude::*;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::engine::protocol::{EngineCommand, EngineReply, EngineRequest};
use crate::engine::worker::{EngineWorker, Execute};
use crate::error::ChessError;

/// Hand a position to the engine on behalf of a session.
#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<(), ChessError>")]
pub struct Submit {
    pub session_id: Uuid,
    pub request: EngineRequest,
}

/// The engine's answer, tagged with the session that asked.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
#[rtype(result = "()")]
pub struct EngineOutput {
    pub session_id: Uuid,
    pub result: Result<String, ChessError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Starting,
    Idle,
    Waiting,
    Failed,
}

pub struct EngineChannel {
    worker: Recipient<Execute>,
    reply_to: Recipient<EngineOutput>,
    phase: Phase,
    queued: Option<Submit>,
}

impl EngineChannel {
    pub fn new(worker: Recipient<Execute>, reply_to: Recipient<EngineOutput>) -> Self {
        Self {
            worker,
            reply_to,
            phase: Phase::Starting,
            queued: None,
        }
    }

    /// Start a dedicated worker thread and a channel in front of it.
    pub fn spawn(reply_to: Recipient<EngineOutput>) -> Addr<EngineChannel> {
        let worker = SyncArbiter::start(1, EngineWorker::new);
        EngineChannel::new(worker.recipient(), reply_to).start()
    }

    fn dispatch(&mut self, submit: Submit, ctx: &mut Context<Self>) {
        let Submit {
            session_id,
            request,
        } = submit;
        self.phase = Phase::Waiting;

        let [position, go] = request.lines();
        debug!("Engine < {position}");
        debug!("Engine < {go}");
        self.worker.do_send(Execute(position));
        let reply = self
            .worker
            .send(Execute(go))
            .into_actor(self)
            .map(move |res, act, _| {
                act.phase = Phase::Idle;
                let result = match res {
                    Ok(Some(line)) => {
                        debug!("Engine > {line}");
                        Ok(line)
                    }
                    Ok(None) => Err(ChessError::Protocol("go left unanswered".into())),
                    Err(e) => {
                        act.phase = Phase::Failed;
                        Err(ChessError::EngineUnavailable(e.to_string()))
                    }
                };
                act.reply_to.do_send(EngineOutput { session_id, result });
            });
        ctx.spawn(reply);
    }

    fn fail_queued(&mut self, reason: String) {
        if let Some(submit) = self.queued.take() {
            self.reply_to.do_send(EngineOutput {
                session_id: submit.session_id,
                result: Err(ChessError::EngineUnavailable(reason)),
            });
        }
    }
}

impl Actor for EngineChannel {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let handshake = self
            .worker
            .send(Execute(EngineCommand::IsReady.to_string()))
            .into_actor(self)
            .map(|res, act, ctx| match res {
                Ok(Some(line)) if EngineReply::parse(&line) == Ok(EngineReply::ReadyOk) => {
                    info!("Engine ready");
                    act.phase = Phase::Idle;
                    if let Some(submit) = act.queued.take() {
                        act.dispatch(submit, ctx);
                    }
                }
                Ok(other) => {
                    warn!("Engine answered {other:?} to isready");
                    act.phase = Phase::Failed;
                    act.fail_queued("no readyok from engine".into());
                }
                Err(e) => {
                    warn!("Engine worker unreachable: {e}");
                    act.phase = Phase::Failed;
                    act.fail_queued(e.to_string());
                }
            });
        ctx.spawn(handshake);
    }
}

impl Handler<Submit> for EngineChannel {
    type Result = Result<(), ChessError>;

    fn handle(&mut self, msg: Submit, ctx: &mut Self::Context) -> Self::Result {
        match self.phase {
            Phase::Starting if self.queued.is_none() => {
                debug!("Engine not ready yet, holding request");
                self.queued = Some(msg);
                Ok(())
            }
            Phase::Idle => {
                self.dispatch(msg, ctx);
                Ok(())
            }
            Phase::Starting | Phase::Waiting => {
                warn!("Refusing second engine request from {}", msg.session_id);
                Err(ChessError::ChannelBusy)
            }
            Phase::Failed => Err(ChessError::EngineUnavailable("engine worker stopped".into())),
        }
    }
}
