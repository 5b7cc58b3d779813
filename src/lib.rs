//! Play chess against an engine in the browser: a WebSocket session host
//! around a session controller, a clock, click resolution and an engine
//! spoken to over a line-based protocol.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;
