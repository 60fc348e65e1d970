use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::claims::Identity;
use crate::error::AppError;

/// Identity the access guard verified for this request.
///
/// The guard stores it in the request extensions, so it lives exactly as long
/// as the request. Using this extractor on a route the guard let through
/// without a token is a 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::InvalidToken)
    }
}
