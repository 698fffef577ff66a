use actix_cors::Cors;
use actix_web::{middleware::Logger, middleware::NormalizePath, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod bootstrap;
mod config;
mod controllers;
mod db;
mod error;
mod models;
mod password;
mod policy;
mod validation;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("notemanager v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;
    let bind_address = config.bind_address.clone();

    log::info!("Opening database at {}", config.database_url);
    let db = match Database::open(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    if let Some(admin) = &config.bootstrap_admin {
        if let Err(e) = bootstrap::ensure_admin(&db, admin) {
            log::error!("Failed to bootstrap admin user: {}", e);
        }
    }

    match db.purge_expired_sessions() {
        Ok(0) => {}
        Ok(n) => log::info!("Purged {} expired sessions", n),
        Err(e) => log::warn!("Failed to purge expired sessions: {}", e),
    }

    log::info!("Starting server on {}:{}", bind_address, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
            }))
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure)
    })
    .bind((bind_address.as_str(), port))?
    .run()
    .await
}
