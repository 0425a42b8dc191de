use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::dtos::rider::{
    AvailableRidersQuery, CreateRiderApplicationRequest, DecideRiderRequest, DecideRiderResponse,
    RiderApplicationResponse, RiderListQuery,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::rider::ApplicationStatus;
use crate::state::AppState;
use crate::store::{DecisionOutcome, NewRiderApplication};

/// The applicant email is stamped from the verified principal, never
/// taken from the body.
pub async fn create_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateRiderApplicationRequest>,
) -> Result<(StatusCode, Json<RiderApplicationResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Name required"));
    }
    if payload.district.trim().is_empty() || payload.region.trim().is_empty() {
        return Err(AppError::validation("District and region required"));
    }

    let application = state
        .store
        .insert_rider_application(
            NewRiderApplication {
                name: payload.name,
                applicant_email: auth.email,
                phone: payload.phone,
                district: payload.district,
                region: payload.region,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(application.into())))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<RiderListQuery>,
) -> Result<Json<Vec<RiderApplicationResponse>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e| AppError::validation(format!("{e}")))?;

    let applications = state.store.list_rider_applications(status).await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

pub async fn available_riders(
    State(state): State<AppState>,
    Query(query): Query<AvailableRidersQuery>,
) -> Result<Json<Vec<RiderApplicationResponse>>, AppError> {
    let applications = state
        .store
        .list_approved_riders(query.district.as_deref())
        .await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// Approve or reject a pending application. Approval promotes the
/// applicant's user record to the rider role in the same unit of work.
pub async fn decide_application(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<DecideRiderRequest>,
) -> Result<Json<DecideRiderResponse>, AppError> {
    let decision = match payload.status.parse::<ApplicationStatus>() {
        Ok(status @ (ApplicationStatus::Approved | ApplicationStatus::Rejected)) => status,
        _ => return Err(AppError::validation("Status must be approved or rejected")),
    };

    let outcome = state.store.decide_rider_application(id, decision).await?;
    match outcome {
        DecisionOutcome::Decided { application, user_role_updated } => {
            if decision == ApplicationStatus::Approved && !user_role_updated {
                tracing::warn!(
                    email = %application.applicant_email,
                    application_id = application.id,
                    "Approved rider has no matching user record"
                );
            }
            Ok(Json(DecideRiderResponse {
                application: application.into(),
                user_role_updated,
            }))
        }
        DecisionOutcome::AlreadyDecided(status) => {
            Err(AppError::conflict(format!("Application already {status}")))
        }
        DecisionOutcome::NotFound => Err(AppError::not_found("Rider application not found")),
    }
}
