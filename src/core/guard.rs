//! Ownership and path-identity checks

use tracing::warn;

use super::error::AuthError;

/// Allow a mutation only when the acting user is the recorded owner.
/// `owner_id` must come from a fresh store read, never from the request.
pub fn authorize_owner(identity: &str, owner_id: &str) -> Result<(), AuthError> {
    if identity != owner_id {
        warn!(user_id = %identity, owner_id = %owner_id, "rejected mutation by non-owner");
        return Err(AuthError::NotOwner);
    }
    Ok(())
}

/// Routes scoped by a `{userId}` path segment only serve the token's own user
pub fn authorize_path_identity(identity: &str, path_user_id: &str) -> Result<(), AuthError> {
    if identity != path_user_id {
        warn!(user_id = %identity, path_user_id = %path_user_id, "rejected access to another user's resources");
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_check() {
        assert!(authorize_owner("a", "a").is_ok());
        assert!(matches!(authorize_owner("b", "a"), Err(AuthError::NotOwner)));
    }

    #[test]
    fn test_path_identity_check_is_distinct_from_ownership() {
        assert!(authorize_path_identity("a", "a").is_ok());
        assert!(matches!(
            authorize_path_identity("a", "b"),
            Err(AuthError::Forbidden)
        ));
    }
}
