use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::rider::{available_riders, create_application, decide_application, list_applications};
use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let verified = Router::new()
        .route("/rider", post(create_application))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/riders", get(list_applications))
        .route("/riders/status/{id}", patch(decide_application))
        .route("/availableriders", get(available_riders))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state, require_auth));

    verified.merge(admin)
}
