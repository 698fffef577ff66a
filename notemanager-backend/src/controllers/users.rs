//! User administration endpoints. Every handler takes an [`Admin`] extractor,
//! so unprivileged callers are turned away with 403 before any lookup.

use actix_web::{web, HttpResponse};

use crate::controllers::parse_id;
use crate::error::ApiError;
use crate::models::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::policy::Admin;
use crate::validation;
use crate::AppState;

/// List all users
async fn list_users(
    _admin: Admin,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let users: Vec<UserResponse> = state
        .db
        .list_users()?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

/// Create a (non-privileged) user
async fn create_user(
    Admin(admin): Admin,
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_user = validation::new_user(body.into_inner(), false)?;
    let user = state.db.create_user(&new_user)?;

    log::info!(
        "Admin {} created user {} (id {})",
        admin.user.username,
        user.username,
        user.id
    );
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Get a user by ID
async fn get_user(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let user = state.db.get_user(id)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Replace a user's username, email and password
async fn replace_user(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let changes = validation::replace_user(body.into_inner())?;
    let user = state.db.update_user(id, &changes)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Partially update a user
async fn update_user(
    _admin: Admin,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let changes = validation::user_changes(body.into_inner())?;
    let user = state.db.update_user(id, &changes)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete a user along with their notes and sessions
async fn delete_user(
    Admin(admin): Admin,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    if !state.db.delete_user(id)? {
        return Err(ApiError::NotFound);
    }

    log::info!("Admin {} deleted user {}", admin.user.username, id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(replace_user))
            .route("/{id}", web::patch().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
