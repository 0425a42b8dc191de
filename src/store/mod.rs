pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::models::parcel::{DeliveryStatus, Parcel, PaymentStatus};
use crate::models::payment::Payment;
use crate::models::rider::{ApplicationStatus, RiderApplication};
use crate::models::user::{Role, User};

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Decode(String),
}

impl StoreError {
    pub fn decode(err: impl fmt::Display) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "database error: {err}"),
            StoreError::Decode(msg) => write!(f, "stored value could not be decoded: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

#[derive(Debug, Clone)]
pub struct NewParcel {
    pub title: String,
    pub created_by: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub cost: i64,
}

/// Conjunctive filter for parcel listings; absent fields impose no
/// constraint.
#[derive(Debug, Clone, Default)]
pub struct ParcelFilter {
    pub created_by: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_status: Option<DeliveryStatus>,
}

#[derive(Debug, Clone)]
pub struct RiderAssignment {
    pub rider_id: i64,
    pub rider_name: String,
    pub rider_email: String,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub parcel_id: i64,
    pub payer_email: String,
    pub amount: i64,
    pub method: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone)]
pub struct NewRiderApplication {
    pub name: String,
    pub applicant_email: String,
    pub phone: String,
    pub district: String,
    pub region: String,
}

/// Result of the guarded unpaid -> paid transition. A payment row exists
/// only in the `Recorded` case.
#[derive(Debug)]
pub enum PaymentOutcome {
    Recorded(Payment),
    AlreadyPaid,
    ParcelNotFound,
}

/// Result of deciding a rider application. `user_role_updated` is false
/// when no user record matched the applicant email; the decision itself
/// still stands and the divergence is left to reconciliation.
#[derive(Debug)]
pub enum DecisionOutcome {
    Decided {
        application: RiderApplication,
        user_role_updated: bool,
    },
    AlreadyDecided(ApplicationStatus),
    NotFound,
}

/// Persistence boundary. Handlers never touch the database directly;
/// tests substitute the in-memory implementation.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn upsert_user(&self, email: &str, now: DateTime<Utc>) -> Result<(User, bool), StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn search_users(&self, email_fragment: &str) -> Result<Vec<User>, StoreError>;
    async fn update_user_role(&self, id: i64, role: Role) -> Result<Option<User>, StoreError>;

    // parcels
    async fn insert_parcel(&self, parcel: NewParcel, now: DateTime<Utc>) -> Result<Parcel, StoreError>;
    async fn list_parcels(&self, filter: &ParcelFilter) -> Result<Vec<Parcel>, StoreError>;
    async fn find_parcel(&self, id: i64) -> Result<Option<Parcel>, StoreError>;
    async fn assign_rider(
        &self,
        parcel_id: i64,
        assignment: RiderAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Parcel>, StoreError>;
    async fn delete_parcel(&self, id: i64, created_by: Option<&str>) -> Result<u64, StoreError>;

    // payments
    async fn record_payment(&self, payment: NewPayment, now: DateTime<Utc>) -> Result<PaymentOutcome, StoreError>;
    async fn list_payments_for(&self, payer_email: &str) -> Result<Vec<Payment>, StoreError>;

    // rider applications
    async fn insert_rider_application(
        &self,
        application: NewRiderApplication,
        now: DateTime<Utc>,
    ) -> Result<RiderApplication, StoreError>;
    async fn list_rider_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<RiderApplication>, StoreError>;
    async fn list_approved_riders(&self, district: Option<&str>) -> Result<Vec<RiderApplication>, StoreError>;
    async fn find_rider_application(&self, id: i64) -> Result<Option<RiderApplication>, StoreError>;
    async fn decide_rider_application(
        &self,
        id: i64,
        decision: ApplicationStatus,
    ) -> Result<DecisionOutcome, StoreError>;
}
