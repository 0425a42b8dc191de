use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::dtos::user::{
    ChangeRoleRequest, RoleResponse, SearchUsersQuery, UpsertUserRequest, UserResponse,
};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::user::Role;
use crate::state::AppState;

/// Public upsert: first sign-in creates the record with the default
/// role, later sign-ins only touch the login timestamp.
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(AppError::validation("Email required"));
    }

    let (user, created) = state.store.upsert_user(email, Utc::now()).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(user.into())))
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let fragment = query.email.as_deref().map(str::trim).unwrap_or_default();
    if fragment.is_empty() {
        return Err(AppError::validation("email query parameter required"));
    }

    let users = state.store.search_users(fragment).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn change_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    // Rider is granted through application approval only.
    let role = match payload.role.as_str() {
        "admin" => Role::Admin,
        "user" => Role::User,
        _ => return Err(AppError::validation("Role must be admin or user")),
    };

    let target = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if target.email == auth.email {
        return Err(AppError::forbidden("Admins cannot change their own role"));
    }

    let updated = state
        .store
        .update_user_role(id, role)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(updated.into()))
}

/// Self role lookup; an absent record reports the default role.
pub async fn get_user_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(email): Path<String>,
) -> Result<Json<RoleResponse>, AppError> {
    if email != auth.email {
        return Err(AppError::forbidden("Role lookup is limited to your own account"));
    }

    let role = state
        .store
        .find_user_by_email(&email)
        .await?
        .map(|u| u.role)
        .unwrap_or_default();
    Ok(Json(RoleResponse { role }))
}
