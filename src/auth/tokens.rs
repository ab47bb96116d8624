use anyhow::Context;
use data_encoding::BASE32_NOPAD;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::{repo::UserStore, repo_types::User};

pub const SCOPE_AUTH: &str = "authentication";

/// Number of random bytes behind every plaintext token.
const TOKEN_BYTES: usize = 32;

/// Opaque bearer token. Only `token` and `expiry` are ever serialized;
/// the digest is what gets stored.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    #[serde(skip)]
    pub scope: String,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("plaintext", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

pub fn token_digest(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub fn generate_token(user_id: i64, ttl: Duration, scope: &str) -> anyhow::Result<Token> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    let plaintext = BASE32_NOPAD.encode(&bytes);
    let hash = token_digest(&plaintext);
    let expiry = OffsetDateTime::now_utc()
        .checked_add(ttl)
        .context("token expiry out of range")?;
    debug!(user_id, scope, %expiry, "token generated");
    Ok(Token {
        plaintext,
        hash,
        user_id,
        expiry,
        scope: scope.to_string(),
    })
}

/// Resolves a presented plaintext to its user. Unknown, expired and
/// wrong-scope tokens all yield `None`.
pub async fn validate(
    users: &dyn UserStore,
    plaintext: &str,
    scope: &str,
) -> anyhow::Result<Option<User>> {
    let digest = token_digest(plaintext);
    users
        .get_user_for_token(&digest, scope, OffsetDateTime::now_utc())
        .await
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::auth::repo::TokenStore;
    use crate::testing::{seed_user, MemoryStore};

    #[test]
    fn plaintext_is_unpadded_base32_of_32_bytes() {
        let token = generate_token(1, Duration::hours(24), SCOPE_AUTH).unwrap();
        assert_eq!(token.plaintext.len(), 52);
        assert!(!token.plaintext.contains('='));
        assert_eq!(BASE32_NOPAD.decode(token.plaintext.as_bytes()).unwrap().len(), 32);
    }

    #[test]
    fn digest_differs_from_plaintext() {
        let token = generate_token(1, Duration::hours(24), SCOPE_AUTH).unwrap();
        assert_eq!(token.hash.len(), 32);
        assert_ne!(token.hash, token.plaintext.as_bytes());
        assert_eq!(token.hash, token_digest(&token.plaintext));
    }

    #[test]
    fn expiry_is_absolute() {
        let before = OffsetDateTime::now_utc();
        let token = generate_token(1, Duration::hours(24), SCOPE_AUTH).unwrap();
        assert!(token.expiry >= before + Duration::hours(24));
        assert!(token.expiry <= OffsetDateTime::now_utc() + Duration::hours(24));
    }

    #[test]
    fn out_of_range_expiry_is_an_error() {
        let err = generate_token(1, Duration::hours(100_000_000), SCOPE_AUTH).unwrap_err();
        assert!(err.to_string().contains("expiry out of range"));
    }

    #[test]
    fn debug_redacts_plaintext_and_digest() {
        let token = generate_token(7, Duration::hours(1), SCOPE_AUTH).unwrap();
        let printed = format!("{:?}", token);
        assert!(!printed.contains(&token.plaintext));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("user_id: 7"));
    }

    #[test]
    fn no_collisions_in_ten_thousand_tokens() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let token = generate_token(1, Duration::minutes(1), SCOPE_AUTH).unwrap();
            assert!(seen.insert(token.plaintext));
        }
    }

    #[test]
    fn serializes_only_token_and_expiry() {
        let token = generate_token(7, Duration::hours(1), SCOPE_AUTH).unwrap();
        let json = serde_json::to_value(&token).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["token"], token.plaintext.as_str());
        assert!(obj.contains_key("expiry"));
    }

    #[tokio::test]
    async fn validates_issued_token() {
        let store = MemoryStore::default();
        let user = seed_user(&store, "alice").await;
        let token = generate_token(user.id, Duration::hours(24), SCOPE_AUTH).unwrap();
        store.create_token(&token).await.unwrap();

        let found = validate(&store, &token.plaintext, SCOPE_AUTH).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn tampered_token_fails() {
        let store = MemoryStore::default();
        let user = seed_user(&store, "alice").await;
        let token = generate_token(user.id, Duration::hours(24), SCOPE_AUTH).unwrap();
        store.create_token(&token).await.unwrap();

        let mut tampered: Vec<char> = token.plaintext.chars().collect();
        tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(validate(&store, &tampered, SCOPE_AUTH).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_is_indistinguishable_from_unknown() {
        let store = MemoryStore::default();
        let user = seed_user(&store, "alice").await;
        let expired = generate_token(user.id, Duration::seconds(-1), SCOPE_AUTH).unwrap();
        store.create_token(&expired).await.unwrap();

        let expired_result = validate(&store, &expired.plaintext, SCOPE_AUTH).await;
        let unknown_result = validate(&store, "NEVERISSUED", SCOPE_AUTH).await;
        assert!(matches!(expired_result, Ok(None)));
        assert!(matches!(unknown_result, Ok(None)));
    }

    #[tokio::test]
    async fn scope_is_part_of_the_lookup_key() {
        let store = MemoryStore::default();
        let user = seed_user(&store, "alice").await;
        let token = generate_token(user.id, Duration::hours(24), SCOPE_AUTH).unwrap();
        store.create_token(&token).await.unwrap();

        assert!(validate(&store, &token.plaintext, "password-reset")
            .await
            .unwrap()
            .is_none());
        assert!(validate(&store, &token.plaintext, SCOPE_AUTH)
            .await
            .unwrap()
            .is_some());
    }
}
