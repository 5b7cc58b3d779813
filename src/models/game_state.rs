use actix::{Addr, SpawnHandle};
use uuid::Uuid;

use crate::engine::channel::EngineChannel;
use crate::game::authority::ChessAuthority;
use crate::game::session::SessionController;

/// The game a connection is currently playing. Replaced wholesale on
/// "new game"; dropping it drops the engine channel and its worker thread.
pub struct ActiveSession {
    pub id: Uuid,
    pub controller: SessionController<ChessAuthority>,
    pub engine: Addr<EngineChannel>,
    pub ticker: Option<SpawnHandle>,
}
