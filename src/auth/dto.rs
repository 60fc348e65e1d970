use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::claims::Identity;
use super::roles::Role;
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?\d{1,15}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Request body for `POST /auth/signup/:role`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    /// Required unless signing up as a buyer.
    #[serde(default)]
    pub product_key: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("Name must not be empty".into()));
        }
        if !is_valid_phone(&self.phone) {
            return Err(AppError::BadRequest("Phone must be a valid phone-number".into()));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest("Password too short".into()));
        }
        Ok(())
    }
}

/// Request body for `POST /auth/signin`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/key`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeyRequest {
    pub email: String,
    pub user_type: Role,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductKeyResponse {
    pub product_key: String,
}

/// Decoded token of the caller, as returned by `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            iat: identity.issued_at.unix_timestamp(),
            exp: identity.expires_at.unix_timestamp(),
        }
    }
}
