use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        services::is_valid_email,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

const MAX_USERNAME_CHARS: usize = 50;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(payload) = payload?;

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    if payload.password.is_empty() {
        warn!("empty password");
        return Err(ApiError::BadRequest("Password must not be empty".into()));
    }

    if let Some(name) = payload.username.as_deref() {
        if name.chars().count() > MAX_USERNAME_CHARS {
            return Err(ApiError::BadRequest(format!(
                "Username must be at most {MAX_USERNAME_CHARS} characters"
            )));
        }
    }

    let user = state
        .auth
        .register_user(&payload.email, &payload.password, payload.username.as_deref())
        .await?;

    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(payload) = payload?;

    let user = state
        .auth
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    info!(user_id = user.user_id, "user logged in");
    Ok(Json(user.into()))
}
