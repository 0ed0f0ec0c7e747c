//! Authentication route handlers.
//!
//! Email/password accounts with server-side sessions, plus the
//! forgotten-password flow.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::services::password_reset::{PasswordResetError, PasswordResetService};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Session Handlers
// =============================================================================

/// `POST /api/auth/register`
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = AuthService::new(state.pool())
        .register_with_password(req.name.as_deref(), &email, &password)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    state
        .notifier()
        .welcome(user.email.as_str(), user.name.as_deref())
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// `POST /api/auth/login`
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<Value>> {
    let (Some(email), Some(password)) = (present(req.email), present(req.password)) else {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let user = AuthService::new(state.pool())
        .login_with_password(&email, &password)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({ "user": user })))
}

/// `POST /api/auth/logout`
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/auth/session`
pub async fn session(OptionalAuth(user): OptionalAuth) -> Json<Value> {
    Json(json!({ "user": user }))
}

// =============================================================================
// Password Reset Handlers
// =============================================================================

fn reset_service(state: &AppState) -> PasswordResetService<'_> {
    PasswordResetService::new(state.pool(), state.notifier(), &state.config().base_url)
}

/// `POST /api/auth/forgot-password`
///
/// Answers the same way for known and unknown emails.
#[tracing::instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let email = present(req.email)
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    reset_service(&state).request_reset(&email).await?;

    Ok(Json(json!({ "success": true })))
}

/// `GET /api/auth/verify-reset-token?token=...`
pub async fn verify_reset_token(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TokenQuery>,
) -> Result<(StatusCode, Json<Value>)> {
    let invalid = |error: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "valid": false, "error": error })),
        )
    };

    let Some(token) = present(query.token) else {
        return Ok(invalid("Token is required"));
    };

    match reset_service(&state).check(&token).await {
        Ok(()) => Ok((StatusCode::OK, Json(json!({ "valid": true })))),
        Err(e @ (PasswordResetError::InvalidToken | PasswordResetError::ExpiredToken)) => {
            Ok(invalid(&e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /api/auth/reset-password`
#[tracing::instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let (Some(token), Some(password)) = (present(req.token), present(req.password)) else {
        return Err(AppError::BadRequest(
            "Token and password are required".to_string(),
        ));
    };

    reset_service(&state).reset(&token, &password).await?;

    Ok(Json(json!({ "success": true })))
}
