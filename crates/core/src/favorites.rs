//! Heart (favorite) relation between users and stores.
//!
//! A user's hearts are a set: adding a store twice has no effect, and removing
//! an absent store has no effect. [`toggle_favorite`] decides what a click on
//! the heart button does given the hearts as currently known.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::StoreId;

/// What a heart toggle does to the user's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartOp {
    /// Insert the store into the set.
    Add,
    /// Remove the store from the set.
    Remove,
}

impl HeartOp {
    /// Apply the operation to an in-memory set.
    ///
    /// Returns `true` if the set changed.
    pub fn apply(self, hearts: &mut BTreeSet<StoreId>, target: StoreId) -> bool {
        match self {
            Self::Add => hearts.insert(target),
            Self::Remove => hearts.remove(&target),
        }
    }

    /// Returns the operation as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Remove when already hearted, add otherwise.
#[must_use]
pub fn toggle_favorite(hearts: &BTreeSet<StoreId>, target: StoreId) -> HeartOp {
    if hearts.contains(&target) {
        HeartOp::Remove
    } else {
        HeartOp::Add
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: StoreId = StoreId::new(1);
    const B: StoreId = StoreId::new(2);
    const C: StoreId = StoreId::new(3);

    fn set(ids: &[StoreId]) -> BTreeSet<StoreId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_present_id_is_removed() {
        assert_eq!(toggle_favorite(&set(&[A, B]), A), HeartOp::Remove);
    }

    #[test]
    fn test_absent_id_is_added() {
        assert_eq!(toggle_favorite(&set(&[A, B]), C), HeartOp::Add);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut hearts = set(&[A, B]);
        assert!(HeartOp::Add.apply(&mut hearts, C));
        assert!(!HeartOp::Add.apply(&mut hearts, C));
        assert_eq!(hearts, set(&[A, B, C]));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut hearts = set(&[A]);
        assert!(!HeartOp::Remove.apply(&mut hearts, B));
        assert_eq!(hearts, set(&[A]));
    }

    #[test]
    fn test_toggle_twice_restores_set() {
        let original = set(&[A, B]);
        let mut hearts = original.clone();
        for _ in 0..2 {
            let op = toggle_favorite(&hearts, C);
            op.apply(&mut hearts, C);
        }
        assert_eq!(hearts, original);
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&HeartOp::Remove).unwrap_or_default(),
            "\"remove\""
        );
        assert_eq!(HeartOp::Add.as_str(), "add");
    }
}
