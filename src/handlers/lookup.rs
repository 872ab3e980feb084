//! Entity lookup endpoints
//!
//! `GET /{entity}/get/{id}` returns one record, `GET /{entity}/get-list` the
//! full list. Single lookups go through the request's id guard so every
//! request counts exactly one conversion outcome.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::middleware::{RequestContext, RequestOutcome};
use crate::store::{Note, User};

/// Successful lookup body, tagged for the instrumentation middleware
type Found<T> = (Extension<RequestOutcome>, Json<T>);

fn found<T>(value: T) -> Found<T> {
    (Extension(RequestOutcome::Found), Json(value))
}

/// Run the `{id}` path parameter through the request's id guard
///
/// A segment axum cannot decode is counted as a failed conversion under its
/// raw, still-encoded form.
fn lookup_id(ctx: &RequestContext, path: Result<Path<String>, PathRejection>) -> AppResult<i64> {
    let guard = ctx.id_guard();
    match path {
        Ok(Path(raw_id)) => Ok(guard.convert(&raw_id)?),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Path parameter rejected");
            let raw_id = ctx.path().rsplit('/').next().unwrap_or_default();
            Err(guard.reject(raw_id).into())
        }
    }
}

/// `GET /user/get/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Found<User>> {
    let id = lookup_id(&ctx, path)?;

    let user = state
        .store()
        .user(id)
        .cloned()
        .ok_or(AppError::NotFound { entity: "user" })?;

    tracing::debug!(user_id = id, "User found");
    Ok(found(user))
}

/// `GET /note/get/{id}`
pub async fn get_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    path: Result<Path<String>, PathRejection>,
) -> AppResult<Found<Note>> {
    let id = lookup_id(&ctx, path)?;

    let note = state
        .store()
        .note(id)
        .cloned()
        .ok_or(AppError::NotFound { entity: "note" })?;

    tracing::debug!(note_id = id, "Note found");
    Ok(found(note))
}

/// `GET /user/get-list`
pub async fn list_users(State(state): State<AppState>) -> AppResult<Found<Vec<User>>> {
    let users = state.store().users();
    if users.is_empty() {
        return Err(AppError::NotFound { entity: "users" });
    }
    Ok(found(users.to_vec()))
}

/// `GET /note/get-list`
pub async fn list_notes(State(state): State<AppState>) -> AppResult<Found<Vec<Note>>> {
    let notes = state.store().notes();
    if notes.is_empty() {
        return Err(AppError::NotFound { entity: "notes" });
    }
    Ok(found(notes.to_vec()))
}
