//! Per-route access control.
//!
//! Each guarded route gets its own [`RouteGuard`] through
//! `route_layer(from_fn_with_state(..))`. The guard resolves the roles the
//! route requires before looking at the request; public routes never pay for
//! token verification. On a protected route the bearer token is verified,
//! the user is loaded and their current role is checked. Every failure ends
//! the request.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::claims::Identity;
use super::roles::RouteId;
use crate::error::AppError;
use crate::state::AppState;

/// Middleware state: the app plus the identity of the route being guarded.
#[derive(Clone)]
pub struct RouteGuard {
    state: AppState,
    route: RouteId,
}

impl RouteGuard {
    pub fn new(state: AppState, route: RouteId) -> Self {
        Self { state, route }
    }
}

/// Token from `Authorization: Bearer <token>`; the scheme is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Access decision for one request.
///
/// `Ok(None)`: public route, nothing verified. `Ok(Some(identity))`: caller
/// authenticated and holds a permitted role. `Err`: deny.
pub async fn check_access(
    state: &AppState,
    route: &RouteId,
    headers: &HeaderMap,
) -> Result<Option<Identity>, AppError> {
    let required = state.roles.resolve(route);
    if required.is_empty() {
        return Ok(None);
    }

    let Some(token) = bearer_token(headers) else {
        debug!(%route, "missing or malformed Authorization header");
        return Err(AppError::InvalidToken);
    };

    let identity = state.jwt.verify(token).map_err(|e| {
        debug!(%route, reason = %e, "token rejected");
        AppError::InvalidToken
    })?;

    let Some(user) = state.users.find_by_id(identity.id).await? else {
        warn!(%route, user_id = identity.id, "token subject no longer exists");
        return Err(AppError::InvalidToken);
    };

    if !required.contains(user.role) {
        warn!(%route, user_id = user.id, role = %user.role, "role not permitted");
        return Err(AppError::Forbidden);
    }

    Ok(Some(identity))
}

pub async fn access_guard(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = check_access(&guard.state, &guard.route, req.headers()).await?;
    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }
    Ok(next.run(req).await)
}
