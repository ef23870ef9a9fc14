use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::auth::Role;
use crate::error::ApiError;
use crate::AppState;

/// HTTP Basic authentication middleware guarding the cash card routes.
///
/// Verifies credentials against the credential store, requires the
/// card-owner role, and injects the resulting `Principal` into request
/// extensions for the handlers. Stateless: every request re-authenticates.
pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (username, password) =
        extract_basic_credentials(request.headers()).map_err(ApiError::unauthorized)?;

    let principal = state.users.authenticate(&username, &password).ok_or_else(|| {
        tracing::warn!("authentication failed for user '{}'", username);
        // Same response for unknown user and wrong password.
        ApiError::unauthorized("Invalid credentials")
    })?;

    if !principal.has_role(Role::CardOwner) {
        tracing::warn!("user '{}' lacks the card-owner role", principal.username);
        return Err(ApiError::forbidden("Cash card access requires the card-owner role"));
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extract the (username, password) pair from a Basic Authorization header.
fn extract_basic_credentials(headers: &HeaderMap) -> Result<(String, String), String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let encoded = auth_str
        .strip_prefix("Basic ")
        .ok_or_else(|| "Authorization header must use Basic scheme".to_string())?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| "Invalid base64 in Authorization header".to_string())?;

    let decoded = String::from_utf8(decoded)
        .map_err(|_| "Authorization credentials are not valid UTF-8".to_string())?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| "Basic credentials must be username:password".to_string())?;

    Ok((username.to_string(), password.to_string()))
}
