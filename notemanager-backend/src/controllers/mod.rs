use actix_web::web;

use crate::error::{ApiError, NON_FIELD_ERRORS};

/// Build an initialized test service around the given `web::Data<AppState>`,
/// wired the same way as the real server.
#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(actix_web::middleware::NormalizePath::trim())
                .configure(crate::controllers::configure),
        )
        .await
    };
}

pub mod auth;
pub mod health;
pub mod notes;
pub mod users;

/// Path identifiers that are not integers name nothing that can exist
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

/// Malformed or non-JSON bodies become a validation failure instead of
/// actix's plain-text 400
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::field(NON_FIELD_ERRORS, err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    health::config_routes(cfg);
    auth::config(cfg);
    users::config(cfg);
    notes::config(cfg);
}
