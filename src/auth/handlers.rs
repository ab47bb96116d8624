use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{CreateTokenRequest, PublicUser, RegisterRequest, TokenResponse, UpdateProfileRequest},
        identity::AuthUser,
        password::{hash_blocking, matches_blocking, DUMMY_PASSWORD},
        repo::DuplicateUser,
        repo_types::NewUser,
        tokens::{generate_token, SCOPE_AUTH},
        validation::{validate_profile_update, validate_register_request},
    },
    errors::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/tokens/authentication", post(create_token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).put(update_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    if let Err(msg) = validate_register_request(&mut payload) {
        warn!(error = %msg, username = %payload.username, "invalid register request");
        return Err(AppError::Validation(msg));
    }

    if state.users.get_user_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict("username already taken".into()));
    }
    if state.users.get_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }

    let password = hash_blocking(std::mem::take(&mut payload.password)).await??;

    let user = state
        .users
        .create_user(&NewUser {
            username: payload.username,
            email: payload.email,
            password,
            bio: payload.bio,
            first_name: payload.first_name,
            last_name: payload.last_name,
            profile_picture: payload.profile_picture,
        })
        .await
        .map_err(duplicate_as_conflict)?;

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// A unique violation that slipped past the pre-checks is still a 409.
fn duplicate_as_conflict(e: anyhow::Error) -> AppError {
    if e.is::<DuplicateUser>() {
        warn!("registration lost a uniqueness race");
        AppError::Conflict(e.to_string())
    } else {
        AppError::Internal(e)
    }
}

/// Exchanges username + password for an `authentication` token.
#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTokenRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let username = payload.username.trim();

    let Some(user) = state.users.get_user_by_username(username).await? else {
        warn!(username = %username, "login unknown username");
        let _ = matches_blocking(DUMMY_PASSWORD.clone(), payload.password).await;
        return Err(AppError::InvalidCredentials);
    };

    let ok = matches_blocking(user.password.clone(), payload.password).await??;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token(user.id, state.config.token.ttl(), SCOPE_AUTH)?;
    state.tokens.create_token(&token).await?;
    state.users.record_login(user.id).await?;

    info!(user_id = user.id, expiry = %token.expiry, "token issued");
    Ok((StatusCode::CREATED, Json(TokenResponse { auth_token: token })))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    AppJson(mut payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<PublicUser>> {
    validate_profile_update(&mut payload).map_err(AppError::Validation)?;

    if let Some(bio) = payload.bio {
        user.bio = bio;
    }
    if let Some(first_name) = payload.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name;
    }
    if let Some(picture) = payload.profile_picture {
        user.profile_picture = picture;
    }

    let updated = state
        .users
        .update_user(&user)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = updated.id, "profile updated");
    Ok(Json(updated.into()))
}
