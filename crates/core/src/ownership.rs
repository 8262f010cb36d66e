//! Store ownership checks.

use crate::types::UserId;

/// The acting user does not own the resource being modified.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("You must own a store in order to edit it!")]
pub struct OwnershipError {
    /// Author of the resource.
    pub author: UserId,
    /// User who attempted the mutation.
    pub actor: UserId,
}

/// Succeeds only when `actor` authored the resource.
///
/// Must be called before any mutation of a store.
///
/// # Errors
///
/// Returns [`OwnershipError`] when the ids differ.
pub fn assert_owner(author: UserId, actor: UserId) -> Result<(), OwnershipError> {
    if author == actor {
        Ok(())
    } else {
        Err(OwnershipError { author, actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_passes() {
        assert!(assert_owner(UserId::new(1), UserId::new(1)).is_ok());
    }

    #[test]
    fn test_non_owner_fails() {
        let err = assert_owner(UserId::new(1), UserId::new(2));
        assert_eq!(
            err,
            Err(OwnershipError {
                author: UserId::new(1),
                actor: UserId::new(2),
            })
        );
    }

    #[test]
    fn test_error_message() {
        let err = OwnershipError {
            author: UserId::new(1),
            actor: UserId::new(2),
        };
        assert_eq!(err.to_string(), "You must own a store in order to edit it!");
    }
}
