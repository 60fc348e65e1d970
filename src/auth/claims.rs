use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::jwt::TokenError;
use super::repo_types::User;

/// JWT payload carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub name: String, // display name
    pub id: i64,      // user ID
    pub iat: i64,     // issued at (unix timestamp)
    pub exp: i64,     // expires at (unix timestamp)
}

/// Who a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: i64,
    pub name: String,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Verified token payload, rebuilt on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl TryFrom<Claims> for Identity {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let issued_at =
            OffsetDateTime::from_unix_timestamp(claims.iat).map_err(|_| TokenError::Malformed)?;
        let expires_at =
            OffsetDateTime::from_unix_timestamp(claims.exp).map_err(|_| TokenError::Malformed)?;
        Ok(Self {
            id: claims.id,
            name: claims.name,
            issued_at,
            expires_at,
        })
    }
}
