//! Access policy.
//!
//! [`Caller`] authenticates a request from its bearer token, [`Admin`] further
//! requires the privileged flag, and [`NoteScope`] is the ownership predicate
//! every note query is filtered by.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::error::ApiError;
use crate::models::User;
use crate::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header. The
/// scheme name is case-insensitive.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let (scheme, token) = req
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim_start()
        .split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// An authenticated caller
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: User,
    /// The session token the request was authenticated with
    pub token: String,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}

fn authenticate(req: &HttpRequest) -> Result<Caller, ApiError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        log::error!("AppState missing from app data");
        ApiError::Internal("application state not configured".to_string())
    })?;

    let token = bearer_token(req).ok_or(ApiError::Unauthenticated)?;

    let session = state
        .db
        .validate_session(token, state.config.session_ttl_hours)?
        .ok_or(ApiError::Unauthenticated)?;

    // Sessions cascade with their user, but a concurrent delete can still race us
    let user = state
        .db
        .get_user(session.user_id)?
        .ok_or(ApiError::Unauthenticated)?;

    Ok(Caller {
        user,
        token: session.token,
    })
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// An authenticated caller with the privileged flag.
///
/// Unauthenticated requests fail with `Unauthenticated`; authenticated but
/// unprivileged ones with `Forbidden`. Never `NotFound`.
#[derive(Debug, Clone)]
pub struct Admin(pub Caller);

impl FromRequest for Admin {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).and_then(|caller| {
            if caller.is_admin() {
                Ok(Admin(caller))
            } else {
                log::warn!(
                    "User {} denied access to {}",
                    caller.user.username,
                    req.path()
                );
                Err(ApiError::Forbidden)
            }
        }))
    }
}

/// Ownership scope applied to every note query.
///
/// Only constructible from a user, so a note query can never run unscoped.
/// Notes outside the scope are reported as missing, never as forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteScope {
    owner_id: i64,
}

impl NoteScope {
    pub fn owned_by(user: &User) -> Self {
        Self { owner_id: user.id }
    }

    pub fn for_caller(caller: &Caller) -> Self {
        Self::owned_by(&caller.user)
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }
}
