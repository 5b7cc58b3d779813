use actix_files as fs;
use actix_web::{web, Result};
use std::path::PathBuf;

use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index(app_state: web::Data<AppState>) -> Result<fs::NamedFile> {
    let path: PathBuf = [app_state.config.static_dir.as_str(), "index.html"]
        .iter()
        .collect();
    Ok(fs::NamedFile::open_async(path).await?)
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &str) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").to(index))
        .service(fs::Files::new("/static", static_dir));
}
