pub mod health;
pub mod tasks;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use taskdeck_service::TaskService;

use crate::auth::{auth_middleware, TokenVerifier};

pub struct InnerAppState {
    pub service: TaskService,
    pub verifier: TokenVerifier,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new().merge(health::routes());

    let protected = Router::new().merge(tasks::routes()).route_layer(
        middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    public
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
