use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{
    auth::{repo_types::User, tokens},
    errors::AppError,
    state::AppState,
};

/// Who is making the request. `Anonymous` stands for "no authenticated user".
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<Result<&str, ()>> {
    let value = headers.get(AUTHORIZATION)?;
    let token = value.to_str().ok().and_then(|v| {
        v.strip_prefix("Bearer ")
            .or_else(|| v.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    });
    Some(token.ok_or(()))
}

/// Resolves the caller's identity and stores it in the request extensions.
///
/// A missing, malformed, unknown or expired token degrades the caller to
/// `Identity::Anonymous`; only a failing token lookup aborts the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match bearer_token(req.headers()) {
        None => Identity::Anonymous,
        Some(Err(())) => {
            warn!("malformed Authorization header; continuing as anonymous");
            Identity::Anonymous
        }
        Some(Ok(token)) => {
            match tokens::validate(state.users.as_ref(), token, tokens::SCOPE_AUTH).await? {
                Some(user) => {
                    debug!(user_id = user.id, "request authenticated");
                    Identity::Authenticated(user)
                }
                None => {
                    warn!("invalid or expired token; continuing as anonymous");
                    Identity::Anonymous
                }
            }
        }
    };
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Short-circuits with 401 unless `authenticate` resolved a user.
pub async fn require_user(req: Request, next: Next) -> Result<Response, AppError> {
    let authenticated = req
        .extensions()
        .get::<Identity>()
        .is_some_and(|identity| !identity.is_anonymous());
    if !authenticated {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// The resolved identity, anonymous if `authenticate` did not run.
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentIdentity(
            parts.extensions.get::<Identity>().cloned().unwrap_or_default(),
        ))
    }
}

/// The authenticated user; rejects anonymous callers with 401.
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Authenticated(user)) => Ok(AuthUser(user.clone())),
            _ => Err(AppError::Unauthorized),
        }
    }
}
