use tracing::warn;

use super::claims::Identity;
use crate::error::AppError;

/// True iff the caller owns the resource.
pub fn authorize(resource_owner_id: i64, identity: &Identity) -> bool {
    resource_owner_id == identity.id
}

/// Ownership check for handlers about to mutate a realtor-owned resource.
/// A mismatch is 403, never 401.
pub fn ensure_owner(resource_owner_id: i64, identity: &Identity) -> Result<(), AppError> {
    if authorize(resource_owner_id, identity) {
        return Ok(());
    }
    warn!(user_id = identity.id, owner_id = resource_owner_id, "not the resource owner");
    Err(AppError::Forbidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn identity(id: i64) -> Identity {
        Identity {
            id,
            name: "Sam".into(),
            issued_at: OffsetDateTime::UNIX_EPOCH,
            expires_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn owner_matches_only_on_equal_ids() {
        assert!(authorize(5, &identity(5)));
        assert!(!authorize(5, &identity(7)));
    }

    #[test]
    fn mismatch_is_forbidden() {
        assert!(ensure_owner(5, &identity(5)).is_ok());
        let err = ensure_owner(5, &identity(7)).unwrap_err();
        assert_eq!(err.code(), 403);
    }
}
