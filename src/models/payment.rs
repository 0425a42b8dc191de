use chrono::{DateTime, Utc};
use serde::Serialize;

/// Written exactly once per successful payment, immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: i64,
    pub parcel_id: i64,
    pub payer_email: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}
