use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::user::{change_user_role, get_user_role, search_users, upsert_user};
use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let open = Router::new().route("/users", post(upsert_user));

    let verified = Router::new()
        .route("/users/{email}/role", get(get_user_role))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // require_auth is the outer layer, so identity runs before the role check.
    let admin = Router::new()
        .route("/users/search", get(search_users))
        .route("/users/role/{id}", patch(change_user_role))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state, require_auth));

    open.merge(verified).merge(admin)
}
