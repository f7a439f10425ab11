use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::require_bearer_middleware},
    app_error::AppResult,
    application::jwt::AccessClaims,
    use_cases::auth::{AuthSession, RegisterInput, UserProfile, current_identity},
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    company: String,
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenPayload {
    #[serde(default)]
    refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    company: String,
    role: String,
    created_at: NaiveDateTime,
    last_login_at: Option<NaiveDateTime>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            company: user.company,
            role: user.role,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: String,
    refresh_token: String,
    user: UserResponse,
    /// Expiry of the access token.
    expires_at: NaiveDateTime,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.user.into(),
            expires_at: session.access_token_expires_at,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    user_id: String,
    email: String,
    name: String,
    role: String,
    company: String,
}

pub fn router(app_state: AppState) -> Router<AppState> {
    // Only /me sits behind the bearer check
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            require_bearer_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .merge(protected)
}

/// POST /auth/register
async fn register(
    State(app_state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let session = app_state
        .auth_use_cases
        .register(RegisterInput {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
            company: payload.company,
        })
        .await?;
    Ok(Json(AuthResponse::from(session)))
}

/// POST /auth/login
async fn login(
    State(app_state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let session = app_state
        .auth_use_cases
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(AuthResponse::from(session)))
}

/// POST /auth/refresh
async fn refresh(
    State(app_state): State<AppState>,
    payload: Result<Json<RefreshTokenPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let session = app_state
        .auth_use_cases
        .refresh(&payload.refresh_token)
        .await?;
    Ok(Json(AuthResponse::from(session)))
}

/// POST /auth/logout
/// Succeeds whether or not the token was known.
async fn logout(
    State(app_state): State<AppState>,
    payload: Result<Json<RefreshTokenPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload?;
    app_state
        .auth_use_cases
        .logout(&payload.refresh_token)
        .await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

/// GET /auth/me
async fn me(Extension(claims): Extension<AccessClaims>) -> impl IntoResponse {
    let identity = current_identity(&claims);
    Json(MeResponse {
        user_id: identity.user_id,
        email: identity.email,
        name: identity.name,
        role: identity.role,
        company: identity.company,
    })
}
