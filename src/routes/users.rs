// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current-user routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Completion;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).post(ensure_me))
        .route("/api/completions", get(get_my_completions))
}

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub external_id: String,
    pub email: String,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            external_id: user.external_id,
            email: user.email,
            created_at: format_utc_rfc3339(user.created_at),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .users
        .get_by_external_id(&user.external_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.external_id)))?;

    Ok(Json(profile.into()))
}

#[derive(Deserialize, Validate)]
struct EnsureUserRequest {
    #[validate(email)]
    email: String,
}

/// Create the user on first sign-in (no-op afterwards).
async fn ensure_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<EnsureUserRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()?;

    let profile = state
        .users
        .ensure_user(&user.external_id, &body.email)
        .await?;

    Ok(Json(profile.into()))
}

/// All completions for the current user, most recent first.
async fn get_my_completions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Completion>>> {
    let completions = state
        .challenges
        .ledger()
        .list_by_user(&user.external_id)
        .await?;

    tracing::debug!(
        external_id = %user.external_id,
        count = completions.len(),
        "Fetched user completions"
    );

    Ok(Json(completions))
}
