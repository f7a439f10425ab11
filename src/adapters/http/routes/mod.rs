pub mod auth;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new().nest("/auth", auth::router(app_state))
}
