use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password is empty")]
    Empty,
    #[error("stored password hash is corrupt: {0}")]
    Corrupt(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Argon2 credential of a user. Only the PHC string is ever held.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

impl Password {
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn new(plain: &str) -> Result<Self, PasswordError> {
        let mut password = Self::default();
        password.set(plain)?;
        Ok(password)
    }

    pub fn set(&mut self, plain: &str) -> Result<(), PasswordError> {
        if plain.is_empty() {
            return Err(PasswordError::Empty);
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hashing(e.to_string())
            })?
            .to_string();
        self.hash = hash;
        Ok(())
    }

    /// `Ok(false)` only for a genuine mismatch; anything else is an error.
    pub fn matches(&self, candidate: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(&self.hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::Corrupt(e.to_string())
        })?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(PasswordError::Hashing(e.to_string()))
            }
        }
    }
}

lazy_static! {
    /// Verified against when a login names an unknown user, so that path
    /// costs the same Argon2 work as a wrong password.
    pub static ref DUMMY_PASSWORD: Password =
        Password::new("liftlog-unknown-user").unwrap_or_default();
}

/// Hashes on the blocking pool so the reactor keeps serving requests.
pub async fn hash_blocking(plain: String) -> anyhow::Result<Result<Password, PasswordError>> {
    Ok(tokio::task::spawn_blocking(move || Password::new(&plain)).await?)
}

pub async fn matches_blocking(
    password: Password,
    candidate: String,
) -> anyhow::Result<Result<bool, PasswordError>> {
    Ok(tokio::task::spawn_blocking(move || password.matches(&candidate)).await?)
}
