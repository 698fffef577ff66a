//! Registration, login/logout and the caller's own account

use actix_web::{web, HttpResponse};

use crate::error::{ApiError, FieldErrors};
use crate::models::{CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, UserResponse};
use crate::password::verify_password;
use crate::policy::Caller;
use crate::validation;
use crate::AppState;

/// Self-registration. Always creates a non-privileged user.
async fn register(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_user = validation::new_user(body.into_inner(), false)?;
    let user = state.db.create_user(&new_user)?;

    log::info!("Registered user {} (id {})", user.username, user.id);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Exchange username and password for a bearer token
async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { username, password } = body.into_inner();

    let (username, password) = match (username, password) {
        (Some(u), Some(p)) => (u, p),
        (u, p) => {
            let mut fields = FieldErrors::new();
            for (name, value) in [("username", u.is_none()), ("password", p.is_none())] {
                if value {
                    fields.insert(name.to_string(), vec!["This field is required.".to_string()]);
                }
            }
            return Err(ApiError::ValidationFailed(fields));
        }
    };

    let user = match state.db.get_user_by_username(username.trim())? {
        Some(user) if verify_password(&password, &user.password_hash) => user,
        _ => {
            log::warn!("Failed login attempt for {:?}", username);
            return Err(ApiError::Unauthenticated);
        }
    };

    if let Err(e) = state.db.purge_expired_sessions() {
        log::warn!("Failed to purge expired sessions: {}", e);
    }

    let session = state
        .db
        .create_session(user.id, state.config.session_ttl_hours)?;
    log::info!("User {} logged in", user.username);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: UserResponse::from(user),
    }))
}

/// End the session the request was made with
async fn logout(
    caller: Caller,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    state.db.delete_session(&caller.token)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn get_me(caller: Caller) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse::from(caller.user))
}

/// Let a user change their own username, email or password
async fn update_me(
    caller: Caller,
    state: web::Data<AppState>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let changes = validation::user_changes(body.into_inner())?;
    let user = state
        .db
        .update_user(caller.user.id, &changes)?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(get_me))
            .route("/me", web::patch().to(update_me)),
    );
}
