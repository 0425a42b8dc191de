use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::parcel::{assign_rider, create_parcel, delete_parcel, get_parcel, list_parcels};
use crate::middleware::auth::{require_admin, require_auth};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    // The list route is singular; clients already depend on it.
    let verified = Router::new()
        .route("/parcel", get(list_parcels))
        .route("/parcels", post(create_parcel))
        .route("/parcels/{id}", get(get_parcel).delete(delete_parcel))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/parcels/assign-rider/{id}", patch(assign_rider))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state, require_auth));

    verified.merge(admin)
}
