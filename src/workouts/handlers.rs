use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{debug, info, instrument};

use crate::{
    auth::identity::{AuthUser, CurrentIdentity},
    errors::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
    workouts::{
        dto::{validate_workout, CreateWorkoutRequest, UpdateWorkoutRequest},
        ownership::ensure_owner,
        repo_types::{NewWorkout, Workout},
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/workouts/:id", get(get_workout))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", post(create_workout))
        .route("/workouts/:id", put(update_workout).delete(delete_workout))
}

#[instrument(skip(state, identity))]
pub async fn get_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<Workout>> {
    debug!(viewer_id = ?identity.user().map(|u| u.id), "fetching workout");
    let workout = state.workouts.get_workout(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(workout))
}

#[instrument(skip_all)]
pub async fn create_workout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateWorkoutRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<Workout>)> {
    let mut workout: NewWorkout = payload.into();
    validate_workout(&mut workout).map_err(AppError::Validation)?;

    let created = state.workouts.create_workout(user.id, &workout).await?;
    info!(user_id = user.id, workout_id = created.id, "workout created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/workouts/{}", created.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(created)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_workout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateWorkoutRequest>,
) -> AppResult<Json<Workout>> {
    ensure_owner(state.workouts.as_ref(), id, &user).await?;

    let existing = state.workouts.get_workout(id).await?.ok_or(AppError::NotFound)?;
    let mut workout = payload.apply_to(existing);
    validate_workout(&mut workout).map_err(AppError::Validation)?;

    let updated = state
        .workouts
        .update_workout(id, &workout)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = user.id, workout_id = id, "workout updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_workout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<StatusCode> {
    ensure_owner(state.workouts.as_ref(), id, &user).await?;

    if !state.workouts.delete_workout(id).await? {
        return Err(AppError::NotFound);
    }
    info!(user_id = user.id, workout_id = id, "workout deleted");
    Ok(StatusCode::NO_CONTENT)
}
