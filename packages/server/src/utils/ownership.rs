use crate::entity::sauce;
use crate::error::AppError;

/// Allow a mutating operation only for the sauce's creator.
///
/// Callers load the record first, so an absent record surfaces as
/// `NotFound` and is never conflated with a denial. Pure predicate; runs
/// before any mutation or asset work.
pub fn require_owner(sauce: &sauce::Model, user_id: i32) -> Result<(), AppError> {
    if sauce.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
