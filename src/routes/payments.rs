use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::payment::{create_payment_intent, list_my_payments, record_payment};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payments", get(list_my_payments))
        .route("/payment", post(record_payment))
        .layer(middleware::from_fn_with_state(state, require_auth))
}
