use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::parcel::{DeliveryStatus, Parcel, PaymentStatus};

#[derive(Deserialize)]
pub struct CreateParcelRequest {
    pub title: String,
    pub receiver_name: String,
    pub receiver_address: String,
    /// Delivery cost in minor currency units.
    pub cost: i64,
}

/// Raw query strings; values are parsed against the status enums so an
/// unknown value maps to a bad-request instead of an empty result.
#[derive(Deserialize)]
pub struct ParcelListQuery {
    pub payment_status: Option<String>,
    pub delivery_status: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignRiderRequest {
    pub rider_id: i64,
}

#[derive(Serialize)]
pub struct ParcelResponse {
    pub id: i64,
    pub title: String,
    pub created_by: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub cost: i64,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    pub rider_id: Option<i64>,
    pub rider_name: Option<String>,
    pub rider_email: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Parcel> for ParcelResponse {
    fn from(parcel: Parcel) -> Self {
        ParcelResponse {
            id: parcel.id,
            title: parcel.title,
            created_by: parcel.created_by,
            receiver_name: parcel.receiver_name,
            receiver_address: parcel.receiver_address,
            cost: parcel.cost,
            payment_status: parcel.payment_status,
            delivery_status: parcel.delivery_status,
            rider_id: parcel.rider_id,
            rider_name: parcel.rider_name,
            rider_email: parcel.rider_email,
            assigned_at: parcel.assigned_at,
            created_at: parcel.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct DeleteParcelResponse {
    pub deleted_count: u64,
}
