use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::dtos::payment::{
    CreateIntentRequest, CreateIntentResponse, PaymentResponse, RecordPaymentRequest,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;
use crate::store::{NewPayment, PaymentOutcome};

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    if payload.amount <= 0 {
        return Err(AppError::validation("Amount must be greater than 0"));
    }
    let currency = payload.currency.unwrap_or_else(|| "usd".to_string());

    let intent = state
        .gateway
        .create_intent(payload.amount, &currency)
        .await
        .map_err(|e| AppError::gateway(e.to_string()))?;
    Ok(Json(CreateIntentResponse { client_secret: intent.client_secret }))
}

pub async fn list_my_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let payments = state.store.list_payments_for(&auth.email).await?;
    Ok(Json(payments.into_iter().map(Into::into).collect()))
}

/// Records a payment behind the unpaid -> paid guard. Zero affected
/// rows from the guard means no payment row is ever written.
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), AppError> {
    if payload.amount <= 0 {
        return Err(AppError::validation("Amount must be greater than 0"));
    }
    if payload.transaction_id.trim().is_empty() {
        return Err(AppError::validation("Transaction id required"));
    }

    let outcome = state
        .store
        .record_payment(
            NewPayment {
                parcel_id: payload.parcel_id,
                payer_email: auth.email,
                amount: payload.amount,
                method: payload.method,
                transaction_id: payload.transaction_id,
            },
            Utc::now(),
        )
        .await?;

    match outcome {
        PaymentOutcome::Recorded(payment) => Ok((StatusCode::CREATED, Json(payment.into()))),
        PaymentOutcome::AlreadyPaid => Err(AppError::conflict("Parcel is already paid")),
        PaymentOutcome::ParcelNotFound => Err(AppError::not_found("Parcel not found")),
    }
}
