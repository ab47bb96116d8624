use tracing::warn;

use crate::{
    auth::repo_types::User,
    errors::{AppError, AppResult},
    workouts::repo::WorkoutStore,
};

/// Allows a mutation only when `user` owns the workout. The owner is read
/// fresh on every call.
///
/// A missing workout is `NotFound` and someone else's is `Forbidden`, so a
/// non-owner can tell that the id exists.
pub async fn ensure_owner(
    workouts: &dyn WorkoutStore,
    workout_id: i64,
    user: &User,
) -> AppResult<()> {
    match workouts.get_owner(workout_id).await? {
        None => Err(AppError::NotFound),
        Some(owner_id) if owner_id != user.id => {
            warn!(workout_id, owner_id, user_id = user.id, "ownership check failed");
            Err(AppError::Forbidden)
        }
        Some(_) => Ok(()),
    }
}
