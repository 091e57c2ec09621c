// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge, completion, and history routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Challenge, Completion};
use crate::services::calendar::normalize_date;
use crate::services::{ActiveChallengeView, CompletedChallengeView, Heatmap, NewChallenge};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/challenges",
            get(get_active_challenges).post(create_challenge),
        )
        .route("/api/challenges/{id}", delete(delete_challenge))
        .route("/api/challenges/{id}/complete", post(complete_challenge))
        .route("/api/challenges/{id}/heatmap", get(get_heatmap))
        .route(
            "/api/challenges/{id}/completions",
            get(get_completions).post(mark_completed),
        )
        .route(
            "/api/challenges/{id}/completions/{date}",
            delete(unmark_completed),
        )
        .route("/api/challenges/{id}/days/{date}", post(mark_day_done))
        .route("/api/history", get(get_completed_challenges))
        .route("/api/history/{id}", delete(delete_completed_challenge))
}

// ─── Challenges ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatedResponse {
    pub id: String,
}

async fn create_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewChallenge>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let challenge = state
        .challenges
        .create_challenge(&user.external_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id: challenge.id }),
    ))
}

/// Active challenges with progress.
async fn get_active_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ActiveChallengeView>>> {
    let challenges = state
        .challenges
        .active_challenges(&user.external_id, chrono::Utc::now())
        .await?;

    tracing::debug!(
        external_id = %user.external_id,
        count = challenges.len(),
        "Fetched active challenges"
    );

    Ok(Json(challenges))
}

async fn complete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Challenge>> {
    let challenge = state
        .challenges
        .complete_challenge(&challenge_id, &user.external_id)
        .await?;
    Ok(Json(challenge))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteChallengeResponse {
    pub success: bool,
    pub completions_removed: usize,
}

async fn delete_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<DeleteChallengeResponse>> {
    let removed = state
        .challenges
        .delete_challenge(&challenge_id, &user.external_id)
        .await?;

    Ok(Json(DeleteChallengeResponse {
        success: true,
        completions_removed: removed,
    }))
}

async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Heatmap>> {
    let today = chrono::Utc::now().date_naive();
    let heatmap = state
        .challenges
        .heatmap(
            &challenge_id,
            &user.external_id,
            today,
            state.config.heatmap_week_start,
        )
        .await?;
    Ok(Json(heatmap))
}

// ─── Completions ─────────────────────────────────────────────

async fn get_completions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<Vec<Completion>>> {
    let completions = state
        .challenges
        .ledger()
        .list_by_challenge(&challenge_id, &user.external_id)
        .await?;
    Ok(Json(completions))
}

#[derive(Deserialize, Validate)]
struct MarkCompletedRequest {
    /// `YYYY-MM-DD` or RFC3339
    date: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    note: Option<String>,
}

/// Mark a day done, optionally with a note. 201 when newly recorded,
/// 200 when the day was already marked.
async fn mark_completed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
    Json(body): Json<MarkCompletedRequest>,
) -> Result<(StatusCode, Json<Completion>)> {
    body.validate()?;
    let date = normalize_date(&body.date)?;
    let note = body.note.filter(|n| !n.trim().is_empty());

    let result = state
        .challenges
        .ledger()
        .mark_done(&challenge_id, &user.external_id, date, note)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result.completion)))
}

/// Mark a day done by path; same semantics as `mark_completed` without a note.
async fn mark_day_done(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((challenge_id, date)): Path<(String, String)>,
) -> Result<(StatusCode, Json<Completion>)> {
    let date = normalize_date(&date)?;

    let result = state
        .challenges
        .ledger()
        .mark_done(&challenge_id, &user.external_id, date, None)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result.completion)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UnmarkResponse {
    /// ID of the removed completion, `null` if the day was not marked
    pub deleted_id: Option<String>,
}

async fn unmark_completed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((challenge_id, date)): Path<(String, String)>,
) -> Result<Json<UnmarkResponse>> {
    let date = normalize_date(&date)?;

    let deleted_id = state
        .challenges
        .ledger()
        .unmark_done(&challenge_id, &user.external_id, date)
        .await?;

    Ok(Json(UnmarkResponse { deleted_id }))
}

// ─── History ─────────────────────────────────────────────────

async fn get_completed_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CompletedChallengeView>>> {
    let challenges = state
        .challenges
        .completed_challenges(&user.external_id)
        .await?;
    Ok(Json(challenges))
}

async fn delete_completed_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
) -> Result<Json<DeleteChallengeResponse>> {
    let removed = state
        .challenges
        .delete_completed_challenge(&challenge_id, &user.external_id)
        .await?;

    Ok(Json(DeleteChallengeResponse {
        success: true,
        completions_removed: removed,
    }))
}
