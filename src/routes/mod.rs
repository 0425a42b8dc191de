pub mod parcels;
pub mod payments;
pub mod riders;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes(state.clone()))
        .merge(riders::routes(state.clone()))
        .merge(parcels::routes(state.clone()))
        .merge(payments::routes(state))
}
