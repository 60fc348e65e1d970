use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::roles::Role;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String, // unique, stored lowercased
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub created_at: OffsetDateTime,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
}
