//! In-memory stores for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    password::Password,
    repo::{DuplicateUser, TokenStore, UserStore},
    repo_types::{NewUser, User},
    tokens::Token,
};
use crate::workouts::{
    repo::WorkoutStore,
    repo_types::{NewWorkout, Workout, WorkoutEntry},
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<Token>,
    workouts: BTreeMap<i64, Workout>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    owner_lookups: AtomicUsize,
    stale_reads: AtomicBool,
}

impl MemoryStore {
    pub fn user_by_name(&self, username: &str) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        inner.users.iter().find(|u| u.username == username).cloned()
    }

    pub fn token_hashes(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.tokens.iter().map(|t| t.hash.clone()).collect()
    }

    pub fn set_owner(&self, workout_id: i64, owner_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.workouts.get_mut(&workout_id) {
            w.user_id = owner_id;
        }
    }

    pub fn owner_lookups(&self) -> usize {
        self.owner_lookups.load(Ordering::SeqCst)
    }

    /// Makes username/email lookups miss, as if a competing registration
    /// committed between the check and the insert.
    pub fn set_stale_reads(&self, stale: bool) {
        self.stale_reads.store(stale, Ordering::SeqCst);
    }

    fn reads_are_stale(&self) -> bool {
        self.stale_reads.load(Ordering::SeqCst)
    }
}

/// Inserts a user directly. Its credential is not a valid hash, so it can
/// only authenticate through tokens.
pub async fn seed_user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: Password::from_hash("seeded"),
            bio: String::new(),
            first_name: "Test".into(),
            last_name: "User".into(),
            profile_picture: String::new(),
        })
        .await
        .unwrap()
}

fn entries_with_ids(inner: &mut Inner, entries: &[WorkoutEntry]) -> Vec<WorkoutEntry> {
    entries
        .iter()
        .map(|e| WorkoutEntry {
            id: inner.next_id(),
            ..e.clone()
        })
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(DuplicateUser.into());
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: inner.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            bio: user.bio.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_picture: user.profile_picture.clone(),
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        if self.reads_are_stale() {
            return Ok(None);
        }
        Ok(self.user_by_name(username))
    }

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        if self.reads_are_stale() {
            return Ok(None);
        }
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(stored) = inner.users.iter_mut().find(|u| u.id == user.id) else {
            return Ok(None);
        };
        stored.bio = user.bio.clone();
        stored.first_name = user.first_name.clone();
        stored.last_name = user.last_name.clone();
        stored.profile_picture = user.profile_picture.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn record_login(&self, user_id: i64) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(stored) = inner.users.iter_mut().find(|u| u.id == user_id) {
            stored.last_login = Some(OffsetDateTime::now_utc());
        }
        Ok(())
    }

    async fn get_user_for_token(
        &self,
        digest: &[u8],
        scope: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        let owner = inner
            .tokens
            .iter()
            .find(|t| t.hash == digest && t.scope == scope && t.expiry > now)
            .map(|t| t.user_id);
        Ok(owner.and_then(|id| inner.users.iter().find(|u| u.id == id).cloned()))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn create_token(&self, token: &Token) -> anyhow::Result<()> {
        self.inner.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }
}

#[async_trait]
impl WorkoutStore for MemoryStore {
    async fn create_workout(&self, owner_id: i64, workout: &NewWorkout) -> anyhow::Result<Workout> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let entries = entries_with_ids(&mut inner, &workout.entries);
        let now = OffsetDateTime::now_utc();
        let created = Workout {
            id,
            user_id: owner_id,
            title: workout.title.clone(),
            description: workout.description.clone(),
            duration_minutes: workout.duration_minutes,
            calories_burned: workout.calories_burned,
            entries,
            created_at: now,
            updated_at: now,
        };
        inner.workouts.insert(id, created.clone());
        Ok(created)
    }

    async fn get_workout(&self, id: i64) -> anyhow::Result<Option<Workout>> {
        Ok(self.inner.lock().unwrap().workouts.get(&id).cloned())
    }

    async fn update_workout(&self, id: i64, workout: &NewWorkout) -> anyhow::Result<Option<Workout>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.workouts.contains_key(&id) {
            return Ok(None);
        }
        let entries = entries_with_ids(&mut inner, &workout.entries);
        let Some(stored) = inner.workouts.get_mut(&id) else {
            return Ok(None);
        };
        stored.title = workout.title.clone();
        stored.description = workout.description.clone();
        stored.duration_minutes = workout.duration_minutes;
        stored.calories_burned = workout.calories_burned;
        stored.entries = entries;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.lock().unwrap().workouts.remove(&id).is_some())
    }

    async fn get_owner(&self, id: i64) -> anyhow::Result<Option<i64>> {
        self.owner_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.lock().unwrap().workouts.get(&id).map(|w| w.user_id))
    }
}
