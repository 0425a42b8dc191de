use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::dtos::parcel::{
    AssignRiderRequest, CreateParcelRequest, DeleteParcelResponse, ParcelListQuery, ParcelResponse,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::rider::ApplicationStatus;
use crate::models::user::Role;
use crate::state::AppState;
use crate::store::{NewParcel, ParcelFilter, RiderAssignment};

async fn role_of(state: &AppState, email: &str) -> Result<Role, AppError> {
    Ok(state
        .store
        .find_user_by_email(email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default())
}

pub async fn create_parcel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateParcelRequest>,
) -> Result<(StatusCode, Json<ParcelResponse>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::validation("Title required"));
    }
    if payload.cost < 0 {
        return Err(AppError::validation("Cost must not be negative"));
    }

    let parcel = state
        .store
        .insert_parcel(
            NewParcel {
                title: payload.title,
                created_by: auth.email,
                receiver_name: payload.receiver_name,
                receiver_address: payload.receiver_address,
                cost: payload.cost,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(parcel.into())))
}

/// Filtered listing: filters are conjunctive, admins see every parcel,
/// everyone else only their own.
pub async fn list_parcels(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ParcelListQuery>,
) -> Result<Json<Vec<ParcelResponse>>, AppError> {
    let payment_status = query
        .payment_status
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e| AppError::validation(format!("{e}")))?;
    let delivery_status = query
        .delivery_status
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e| AppError::validation(format!("{e}")))?;

    let role = role_of(&state, &auth.email).await?;
    let filter = ParcelFilter {
        created_by: (role != Role::Admin).then(|| auth.email.clone()),
        payment_status,
        delivery_status,
    };

    let parcels = state.store.list_parcels(&filter).await?;
    Ok(Json(parcels.into_iter().map(Into::into).collect()))
}

pub async fn get_parcel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ParcelResponse>, AppError> {
    let parcel = state
        .store
        .find_parcel(id)
        .await?
        .ok_or_else(|| AppError::not_found("Parcel not found"))?;

    if parcel.created_by != auth.email && role_of(&state, &auth.email).await? != Role::Admin {
        return Err(AppError::forbidden("You can only view your own parcels"));
    }
    Ok(Json(parcel.into()))
}

/// Admin assignment. Only an approved application can be put on a parcel.
pub async fn assign_rider(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AssignRiderRequest>,
) -> Result<Json<ParcelResponse>, AppError> {
    let application = state
        .store
        .find_rider_application(payload.rider_id)
        .await?
        .ok_or_else(|| AppError::not_found("Rider application not found"))?;
    if application.status != ApplicationStatus::Approved {
        return Err(AppError::conflict("Rider is not approved"));
    }

    let parcel = state
        .store
        .assign_rider(
            id,
            RiderAssignment {
                rider_id: application.id,
                rider_name: application.name,
                rider_email: application.applicant_email,
            },
            Utc::now(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Parcel not found"))?;
    Ok(Json(parcel.into()))
}

/// Deleting an absent parcel is not an error; the count says what happened.
pub async fn delete_parcel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteParcelResponse>, AppError> {
    let role = role_of(&state, &auth.email).await?;
    let created_by = (role != Role::Admin).then_some(auth.email.as_str());

    let deleted_count = state.store.delete_parcel(id, created_by).await?;
    Ok(Json(DeleteParcelResponse { deleted_count }))
}
