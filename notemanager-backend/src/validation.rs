//! Input validation: turns request bodies into validated store inputs,
//! collecting every field error before failing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ApiError, FieldErrors};
use crate::models::{
    CreateNoteRequest, CreateUserRequest, NewNote, NewUser, NoteChanges, UpdateNoteRequest,
    UpdateUserRequest, UserChanges,
};
use crate::password::hash_password;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const TITLE_MAX_LEN: usize = 200;

const REQUIRED: &str = "This field is required.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex is valid"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

#[derive(Default)]
struct Errors(FieldErrors);

impl Errors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed(self.0))
        }
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ApiError> {
        self.into_result().map(|()| value())
    }
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        ApiError::Internal(e.to_string())
    })
}

fn check_username(errors: &mut Errors, username: &str) {
    if username.is_empty() {
        errors.add("username", "This field may not be blank.");
    } else if username.chars().count() > USERNAME_MAX_LEN {
        errors.add(
            "username",
            format!("Ensure this field has no more than {} characters.", USERNAME_MAX_LEN),
        );
    } else if !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(errors: &mut Errors, email: &str) {
    if email.is_empty() {
        return;
    }
    if email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

fn check_password(errors: &mut Errors, password: &str) {
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("Ensure this field has at least {} characters.", PASSWORD_MIN_LEN),
        );
    }
}

fn check_title(errors: &mut Errors, title: &str) {
    if title.trim().is_empty() {
        errors.add("title", "This field may not be blank.");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add(
            "title",
            format!("Ensure this field has no more than {} characters.", TITLE_MAX_LEN),
        );
    }
}

/// Validate a full user body (create, register, PUT). The password is hashed
/// only once every field has passed.
pub fn new_user(request: CreateUserRequest, is_admin: bool) -> Result<NewUser, ApiError> {
    let mut errors = Errors::default();

    let username = request.username.map(|u| u.trim().to_string());
    let email = request.email.map(|e| e.trim().to_string()).unwrap_or_default();

    match &username {
        Some(u) => check_username(&mut errors, u),
        None => errors.add("username", REQUIRED),
    }
    check_email(&mut errors, &email);
    match &request.password {
        Some(p) => check_password(&mut errors, p),
        None => errors.add("password", REQUIRED),
    }

    errors.into_result()?;

    Ok(NewUser {
        username: username.unwrap_or_default(),
        email,
        password_hash: hash(request.password.as_deref().unwrap_or_default())?,
        is_admin,
    })
}

/// PUT on a user: username and password must be present. An omitted email
/// keeps its stored value.
pub fn replace_user(request: CreateUserRequest) -> Result<UserChanges, ApiError> {
    let email_supplied = request.email.is_some();
    let validated = new_user(request, false)?;
    Ok(UserChanges {
        username: Some(validated.username),
        email: email_supplied.then_some(validated.email),
        password_hash: Some(validated.password_hash),
    })
}

/// PATCH on a user: only supplied fields are validated and changed
pub fn user_changes(request: UpdateUserRequest) -> Result<UserChanges, ApiError> {
    let mut errors = Errors::default();

    let username = request.username.map(|u| u.trim().to_string());
    let email = request.email.map(|e| e.trim().to_string());

    if let Some(u) = &username {
        check_username(&mut errors, u);
    }
    if let Some(e) = &email {
        check_email(&mut errors, e);
    }
    if let Some(p) = &request.password {
        check_password(&mut errors, p);
    }

    errors.into_result()?;

    let password_hash = match request.password.as_deref() {
        Some(p) => Some(hash(p)?),
        None => None,
    };
    Ok(UserChanges {
        username,
        email,
        password_hash,
    })
}

/// Validate a note body for create or PUT
pub fn new_note(request: CreateNoteRequest) -> Result<NewNote, ApiError> {
    let mut errors = Errors::default();

    match &request.title {
        Some(t) => check_title(&mut errors, t),
        None => errors.add("title", REQUIRED),
    }
    if request.description.is_none() {
        errors.add("description", REQUIRED);
    }

    errors.finish(|| NewNote {
        title: request.title.unwrap_or_default(),
        description: request.description.unwrap_or_default(),
    })
}

/// PATCH on a note
pub fn note_changes(request: UpdateNoteRequest) -> Result<NoteChanges, ApiError> {
    let mut errors = Errors::default();

    if let Some(t) = &request.title {
        check_title(&mut errors, t);
    }

    errors.finish(|| NoteChanges {
        title: request.title,
        description: request.description,
    })
}
