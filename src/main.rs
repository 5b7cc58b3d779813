use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;

use chess_engine_web::config::AppConfig;
use chess_engine_web::models::AppState;
use chess_engine_web::routes::configure_routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let bind_addr = config.bind_addr.clone();
    let static_dir = config.static_dir.clone();

    let app_state = web::Data::new(AppState::new(config));

    info!("Starting chess server at http://{}", bind_addr);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| configure_routes(cfg, &static_dir))
    })
    .bind(bind_addr)?
    .run()
    .await
}
