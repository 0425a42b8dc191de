use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::payment::Payment;

#[derive(Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: Option<String>,
}

#[derive(Serialize)]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

#[derive(Deserialize)]
pub struct RecordPaymentRequest {
    pub parcel_id: i64,
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: i64,
    pub parcel_id: i64,
    pub payer_email: String,
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        PaymentResponse {
            id: payment.id,
            parcel_id: payment.parcel_id,
            payer_email: payment.payer_email,
            amount: payment.amount,
            method: payment.method,
            transaction_id: payment.transaction_id,
            paid_at: payment.paid_at,
        }
    }
}
