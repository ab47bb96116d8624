use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::password::Password;

/// User row as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: String,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Domain user. The credential never leaves the server.
/// Responses go through `PublicUser`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: Password,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: String,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password: Password::from_hash(r.password_hash),
            bio: r.bio,
            first_name: r.first_name,
            last_name: r.last_name,
            profile_picture: r.profile_picture,
            last_login: r.last_login,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Validated registration data, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Password,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: String,
}
