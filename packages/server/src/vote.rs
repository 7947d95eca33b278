//! Vote state machine for sauce records.
//!
//! A caller's state with respect to one sauce is derived from the two
//! membership sets: `Liked` iff present in `users_liked`, `Disliked` iff
//! present in `users_disliked`, `Neutral` otherwise. Transitions keep the
//! sets disjoint and the counters equal to the set cardinalities.

use crate::entity::sauce::UserIdSet;
use crate::error::AppError;

/// What a caller asks for when voting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteIntent {
    Like,
    Dislike,
    Neutral,
}

impl VoteIntent {
    /// Map the wire value (`1`, `-1`, `0`) to an intent.
    pub fn from_wire(value: i8) -> Result<Self, AppError> {
        match value {
            1 => Ok(Self::Like),
            -1 => Ok(Self::Dislike),
            0 => Ok(Self::Neutral),
            other => Err(AppError::Validation(format!(
                "like must be -1, 0 or 1 (got {other})"
            ))),
        }
    }
}

/// How a transition turned out, for the acknowledgement message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Liked,
    Disliked,
    Cleared,
    Unchanged,
}

impl VoteOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Liked => "Sauce liked",
            Self::Disliked => "Sauce disliked",
            Self::Cleared => "Vote removed",
            Self::Unchanged => "Vote unchanged",
        }
    }
}

/// Next persisted vote state of one sauce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteTransition {
    pub users_liked: UserIdSet,
    pub users_disliked: UserIdSet,
    pub likes: i32,
    pub dislikes: i32,
    pub outcome: VoteOutcome,
}

/// Compute the transition for `user_id` requesting `intent`.
///
/// Pure function; the caller persists the returned sets and counters in a
/// single row update. Counters are recomputed from the set cardinalities,
/// so they cannot drift from membership.
///
/// A `Like` from the `Disliked` state (and the mirror case) is an atomic
/// switch: the retraction and the new vote land in the same transition.
/// `Neutral` checks both sets and retracts from whichever holds the caller,
/// rather than assuming membership in exactly one.
pub fn apply(
    users_liked: &UserIdSet,
    users_disliked: &UserIdSet,
    user_id: i32,
    intent: VoteIntent,
) -> VoteTransition {
    let mut liked = users_liked.clone();
    let mut disliked = users_disliked.clone();

    let outcome = match intent {
        VoteIntent::Like => {
            if liked.insert(user_id) {
                disliked.remove(user_id);
                VoteOutcome::Liked
            } else {
                VoteOutcome::Unchanged
            }
        }
        VoteIntent::Dislike => {
            if disliked.insert(user_id) {
                liked.remove(user_id);
                VoteOutcome::Disliked
            } else {
                VoteOutcome::Unchanged
            }
        }
        VoteIntent::Neutral => {
            let was_liked = liked.remove(user_id);
            let was_disliked = disliked.remove(user_id);
            if was_liked || was_disliked {
                VoteOutcome::Cleared
            } else {
                VoteOutcome::Unchanged
            }
        }
    };

    VoteTransition {
        likes: liked.count(),
        dislikes: disliked.count(),
        users_liked: liked,
        users_disliked: disliked,
        outcome,
    }
}
