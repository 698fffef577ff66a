//! Notes REST API.
//!
//! Every handler derives a [`NoteScope`] from the caller before touching the
//! store. A note owned by someone else is reported as 404, same as a missing
//! one, so its existence is never disclosed.

use actix_web::{web, HttpResponse};

use crate::controllers::parse_id;
use crate::error::ApiError;
use crate::models::{CreateNoteRequest, NoteChanges, NoteResponse, UpdateNoteRequest};
use crate::policy::{Caller, NoteScope};
use crate::validation;
use crate::AppState;

/// List the caller's notes
async fn list_notes(
    caller: Caller,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let scope = NoteScope::for_caller(&caller);
    let notes: Vec<NoteResponse> = state
        .db
        .list_notes(&scope)?
        .into_iter()
        .map(NoteResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(notes))
}

/// Create a note owned by the caller; any owner in the body is ignored
async fn create_note(
    caller: Caller,
    state: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_note = validation::new_note(body.into_inner())?;
    let scope = NoteScope::for_caller(&caller);
    let note = state.db.create_note(&scope, &new_note)?;

    log::info!("User {} created note {}", caller.user.username, note.id);
    Ok(HttpResponse::Created().json(NoteResponse::from(note)))
}

async fn get_note(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let scope = NoteScope::for_caller(&caller);
    let note = state.db.get_note(&scope, id)?.ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(NoteResponse::from(note)))
}

/// Replace title and description
async fn replace_note(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let scope = NoteScope::for_caller(&caller);
    let replacement = validation::new_note(body.into_inner())?;
    let changes = NoteChanges {
        title: Some(replacement.title),
        description: Some(replacement.description),
    };
    let note = state
        .db
        .update_note(&scope, id, &changes)?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(NoteResponse::from(note)))
}

async fn update_note(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let scope = NoteScope::for_caller(&caller);
    let changes = validation::note_changes(body.into_inner())?;
    let note = state
        .db
        .update_note(&scope, id, &changes)?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(NoteResponse::from(note)))
}

async fn delete_note(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path)?;
    let scope = NoteScope::for_caller(&caller);
    if !state.db.delete_note(&scope, id)? {
        return Err(ApiError::NotFound);
    }

    log::info!("User {} deleted note {}", caller.user.username, id);
    Ok(HttpResponse::NoContent().finish())
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("", web::get().to(list_notes))
            .route("", web::post().to(create_note))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::put().to(replace_note))
            .route("/{id}", web::patch().to(update_note))
            .route("/{id}", web::delete().to(delete_note)),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    use crate::controllers::test_support::{bearer, seed_user, state};
    use crate::models::{NewNote, Note, NoteResponse, User};
    use crate::policy::NoteScope;
    use crate::AppState;

    fn seed_note(state: &actix_web::web::Data<AppState>, owner: &User, title: &str) -> Note {
        state
            .db
            .create_note(
                &NoteScope::owned_by(owner),
                &NewNote {
                    title: title.to_string(),
                    description: format!("This is {}.", title),
                },
            )
            .unwrap()
    }

    #[actix_web::test]
    async fn test_user_can_list_notes() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let other = seed_user(&state, "anotheruser", "anotherpass", false);
        seed_note(&state, &user, "Test Note");
        seed_note(&state, &other, "Another Note");
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/notes/")
            .insert_header(bearer(&state, &user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let notes: Vec<NoteResponse> = test::read_body_json(resp).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Test Note");
        assert_eq!(notes[0].user.username, "user");
    }

    #[actix_web::test]
    async fn test_user_can_create_note() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/notes/")
            .insert_header(bearer(&state, &user))
            .set_json(json!({
                "title": "New Note",
                "description": "This is a new note."
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let note: NoteResponse = test::read_body_json(resp).await;
        assert_eq!(note.title, "New Note");
        assert_eq!(note.user.id, user.id);
        assert_eq!(note.created_at, note.updated_at);

        let stored = state.db.list_notes(&NoteScope::owned_by(&user)).unwrap();
        assert!(stored.iter().any(|n| n.title == "New Note"));
    }

    #[actix_web::test]
    async fn test_owner_cannot_be_spoofed() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let other = seed_user(&state, "anotheruser", "anotherpass", false);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/notes/")
            .insert_header(bearer(&state, &user))
            .set_json(json!({
                "title": "Planted",
                "description": "",
                "user": { "id": other.id, "username": "anotheruser", "email": "" },
                "user_id": other.id,
                "created_at": "2000-01-01T00:00:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let note: NoteResponse = test::read_body_json(resp).await;
        assert_eq!(note.user.id, user.id);
        assert_ne!(note.created_at.to_rfc3339(), "2000-01-01T00:00:00+00:00");
        assert!(state.db.list_notes(&NoteScope::owned_by(&other)).unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_update_cannot_reassign_owner() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let other = seed_user(&state, "anotheruser", "anotherpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        let planted = json!({ "id": other.id, "username": "anotheruser", "email": "" });
        for req in [
            test::TestRequest::patch().uri(&format!("/notes/{}/", note.id)).set_json(json!({
                "title": "Patched",
                "user": planted,
                "user_id": other.id,
                "created_at": "2000-01-01T00:00:00Z"
            })),
            test::TestRequest::put().uri(&format!("/notes/{}/", note.id)).set_json(json!({
                "title": "Replaced",
                "description": "Fresh body",
                "user": planted,
                "user_id": other.id,
                "created_at": "2000-01-01T00:00:00Z"
            })),
        ] {
            let req = req.insert_header(bearer(&state, &user)).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let body: NoteResponse = test::read_body_json(resp).await;
            assert_eq!(body.user.id, user.id);
            assert_eq!(body.created_at, note.created_at);
        }

        let stored = state
            .db
            .get_note(&NoteScope::owned_by(&user), note.id)
            .unwrap()
            .expect("note still belongs to its owner");
        assert_eq!(stored.title, "Replaced");
        assert_eq!(stored.owner.id, user.id);
        assert_eq!(stored.created_at, note.created_at);
        assert!(state.db.list_notes(&NoteScope::owned_by(&other)).unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_create_note_validation() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/notes/")
            .insert_header(bearer(&state, &user))
            .set_json(json!({ "description": "no title" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["fields"]["title"][0], "This field is required.");

        let req = test::TestRequest::post()
            .uri("/notes/")
            .insert_header(bearer(&state, &user))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["fields"]["non_field_errors"].is_array());
    }

    #[actix_web::test]
    async fn test_user_can_retrieve_own_note() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/notes/{}/", note.id))
            .insert_header(bearer(&state, &user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Test Note");
        assert_eq!(body["user"]["username"], "user");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body.get("created_at").is_some());
        assert!(body.get("updated_at").is_some());
    }

    #[actix_web::test]
    async fn test_user_can_update_own_note() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let req = test::TestRequest::patch()
            .uri(&format!("/notes/{}/", note.id))
            .insert_header(bearer(&state, &user))
            .set_json(json!({ "title": "Updated Note" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = state
            .db
            .get_note(&NoteScope::owned_by(&user), note.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.title, "Updated Note");
        assert_eq!(stored.description, "This is Test Note.");
        assert_eq!(stored.created_at, note.created_at);
        assert!(stored.updated_at > note.updated_at);
    }

    #[actix_web::test]
    async fn test_user_can_replace_own_note() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/notes/{}", note.id))
            .insert_header(bearer(&state, &user))
            .set_json(json!({ "title": "Replaced" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/notes/{}", note.id))
            .insert_header(bearer(&state, &user))
            .set_json(json!({ "title": "Replaced", "description": "Fresh body" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: NoteResponse = test::read_body_json(resp).await;
        assert_eq!(body.title, "Replaced");
        assert_eq!(body.description, "Fresh body");
    }

    #[actix_web::test]
    async fn test_user_can_delete_own_note() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        let req = test::TestRequest::delete()
            .uri(&format!("/notes/{}/", note.id))
            .insert_header(bearer(&state, &user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri(&format!("/notes/{}/", note.id))
            .insert_header(bearer(&state, &user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_user_cannot_access_other_users_notes() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let other = seed_user(&state, "anotheruser", "anotherpass", false);
        let another_note = seed_note(&state, &other, "Another Note");
        let app = test_app!(state);

        let item = format!("/notes/{}/", another_note.id);
        let requests = vec![
            test::TestRequest::get().uri(&item),
            test::TestRequest::patch().uri(&item).set_json(json!({ "title": "Mine now" })),
            test::TestRequest::put()
                .uri(&item)
                .set_json(json!({ "title": "Mine now", "description": "" })),
            test::TestRequest::delete().uri(&item),
        ];

        for req in requests {
            let req = req.insert_header(bearer(&state, &user)).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }

        let untouched = state
            .db
            .get_note(&NoteScope::owned_by(&other), another_note.id)
            .unwrap()
            .expect("note still exists");
        assert_eq!(untouched.title, "Another Note");
    }

    #[actix_web::test]
    async fn test_admin_gets_no_override_on_notes() {
        let state = state();
        let admin = seed_user(&state, "admin", "adminpass", true);
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Private");
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/notes/{}/", note.id))
            .insert_header(bearer(&state, &admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_notes_require_authentication() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let note = seed_note(&state, &user, "Test Note");
        let app = test_app!(state);

        for req in [
            test::TestRequest::get().uri("/notes/"),
            test::TestRequest::post()
                .uri("/notes/")
                .set_json(json!({ "title": "x", "description": "y" })),
            test::TestRequest::get().uri(&format!("/notes/{}/", note.id)),
            test::TestRequest::delete().uri(&format!("/notes/{}/", note.id)),
        ] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                resp.headers().get(actix_web::http::header::WWW_AUTHENTICATE).unwrap(),
                "Bearer"
            );
        }
    }

    #[actix_web::test]
    async fn test_malformed_note_id_is_not_found() {
        let state = state();
        let user = seed_user(&state, "user", "userpass", false);
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/notes/not-a-number/")
            .insert_header(bearer(&state, &user))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
