use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::rider::{ApplicationStatus, RiderApplication};

#[derive(Deserialize)]
pub struct CreateRiderApplicationRequest {
    pub name: String,
    pub phone: String,
    pub district: String,
    pub region: String,
}

#[derive(Deserialize)]
pub struct RiderListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AvailableRidersQuery {
    pub district: Option<String>,
}

#[derive(Deserialize)]
pub struct DecideRiderRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct RiderApplicationResponse {
    pub id: i64,
    pub name: String,
    pub applicant_email: String,
    pub phone: String,
    pub district: String,
    pub region: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<RiderApplication> for RiderApplicationResponse {
    fn from(application: RiderApplication) -> Self {
        RiderApplicationResponse {
            id: application.id,
            name: application.name,
            applicant_email: application.applicant_email,
            phone: application.phone,
            district: application.district,
            region: application.region,
            status: application.status,
            created_at: application.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct DecideRiderResponse {
    pub application: RiderApplicationResponse,
    /// False when no user record matched the applicant email; the
    /// decision still stands and the divergence is reconciled later.
    pub user_role_updated: bool,
}
