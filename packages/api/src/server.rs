//! # Reference backend server
//!
//! An axum router serving the entry and auth endpoints over an in-process
//! [`MemoryBackend`]. Entry ids are UUID v4 strings.
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/api/entries` | `200` with the entry list |
//! | `POST` | `/api/entries` | `201` with the stored entry, `422` on invalid fields |
//! | `PUT` | `/api/entries/{id}` | `204`, `422` on invalid fields; unknown ids are ignored |
//! | `DELETE` | `/api/entries/{id}` | `204`; unknown ids are ignored |
//! | `GET` | `/api/auth/me` | `200` with the signed-in user or `null` |
//! | `POST` | `/api/auth/logout` | `204` |

use std::sync::{Arc, RwLock};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use owl_store::{Entry, EntryDraft, MemoryBackend, UserInfo, ValidationError};
use serde::Deserialize;
use thiserror::Error;

/// Shared state of the reference server.
#[derive(Clone, Default)]
pub struct ServerState {
    backend: MemoryBackend,
    user: Arc<RwLock<Option<UserInfo>>>,
}

impl ServerState {
    pub fn new(backend: MemoryBackend) -> Self {
        Self {
            backend,
            user: Arc::default(),
        }
    }

    /// Start with `user` signed in.
    pub fn with_user(self, user: UserInfo) -> Self {
        *self.user.write().unwrap() = Some(user);
        self
    }

    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }
}

/// Entry fields as sent by clients. The type is validated server-side.
#[derive(Debug, Deserialize)]
pub struct EntryPayload {
    pub name: String,
    pub r#type: String,
    pub url: String,
    pub creator: String,
}

impl From<EntryPayload> for EntryDraft {
    fn from(payload: EntryPayload) -> Self {
        EntryDraft {
            name: payload.name,
            r#type: payload.r#type,
            url: payload.url,
            creator: payload.creator,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/entries", get(list_entries).post(create_entry))
        .route("/api/entries/{id}", put(update_entry).delete(delete_entry))
        .route("/api/auth/me", get(current_user))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}

async fn list_entries(State(state): State<ServerState>) -> Json<Vec<Entry>> {
    Json(state.backend.snapshot())
}

async fn create_entry(
    State(state): State<ServerState>,
    Json(payload): Json<EntryPayload>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let fields = EntryDraft::from(payload).validate()?;
    let entry = state
        .backend
        .insert_with_id(uuid::Uuid::new_v4().to_string(), fields);
    tracing::info!(id = %entry.id, "entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<EntryPayload>,
) -> Result<StatusCode, ApiError> {
    let fields = EntryDraft::from(payload).validate()?;
    if state.backend.replace(&id, fields).is_none() {
        tracing::debug!(id = %id, "update of unknown entry ignored");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_entry(State(state): State<ServerState>, Path(id): Path<String>) -> StatusCode {
    if state.backend.remove(&id).is_none() {
        tracing::debug!(id = %id, "delete of unknown entry ignored");
    }
    StatusCode::NO_CONTENT
}

async fn current_user(State(state): State<ServerState>) -> Json<Option<UserInfo>> {
    Json(state.user.read().unwrap().clone())
}

async fn logout(State(state): State<ServerState>) -> StatusCode {
    if let Some(user) = state.user.write().unwrap().take() {
        tracing::info!(user = %user.id, "signed out");
    }
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use owl_store::{EntryFields, EntryType};

    #[test]
    fn test_payload_validation() {
        let payload: EntryPayload = serde_json::from_str(
            r#"{"name":"Docs","type":"Podcast","url":"https://d","creator":"Me"}"#,
        )
        .unwrap();
        assert_eq!(
            EntryDraft::from(payload).validate(),
            Err(ValidationError::UnknownType("Podcast".to_string()))
        );

        // Clients send EntryFields as-is
        let fields = EntryFields::new("Docs", EntryType::Video, "https://d", "Me");
        let payload: EntryPayload =
            serde_json::from_value(serde_json::to_value(&fields).unwrap()).unwrap();
        assert_eq!(EntryDraft::from(payload).validate(), Ok(fields));
    }

    #[test]
    fn test_invalid_maps_to_422() {
        let resp = ApiError::from(ValidationError::Missing(owl_store::EntryField::Url))
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
