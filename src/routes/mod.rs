pub mod admin;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Assemble the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(pages::router(state.clone()))
        .nest("/admin", admin::router(state))
}
