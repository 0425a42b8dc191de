use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// Verified principal attached to request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub email: String,
}

/// Identity stage: absence of a bearer token is unauthorized, a token
/// that fails verification is forbidden.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingCredential)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingCredential)?;

    let claims = verify_token(token, &state.settings.jwt_secret)?;

    req.extensions_mut().insert(AuthContext { email: claims.email });
    Ok(next.run(req).await)
}

/// Role stage: runs after `require_auth` and checks the stored role.
/// A principal without a user record is refused like any non-admin.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AppError::MissingCredential)?;

    let user = state.store.find_user_by_email(&auth.email).await?;
    match user {
        Some(user) if user.role == Role::Admin => Ok(next.run(req).await),
        _ => Err(AppError::forbidden("Admin access required")),
    }
}
