use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::workouts::repo_types::{NewWorkout, Workout, WorkoutEntry, WorkoutRow};

#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn create_workout(&self, owner_id: i64, workout: &NewWorkout) -> anyhow::Result<Workout>;
    async fn get_workout(&self, id: i64) -> anyhow::Result<Option<Workout>>;
    /// Replaces the workout and its entries. `None` if it does not exist.
    async fn update_workout(&self, id: i64, workout: &NewWorkout) -> anyhow::Result<Option<Workout>>;
    /// Returns `false` if nothing was deleted.
    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool>;
    async fn get_owner(&self, id: i64) -> anyhow::Result<Option<i64>>;
}

#[derive(Clone)]
pub struct PgWorkoutStore {
    db: PgPool,
}

impl PgWorkoutStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_entries(
    tx: &mut Transaction<'_, Postgres>,
    workout_id: i64,
    entries: &[WorkoutEntry],
) -> anyhow::Result<Vec<WorkoutEntry>> {
    let mut inserted = Vec::with_capacity(entries.len());
    for entry in entries {
        let row = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            INSERT INTO workout_entries
                (workout_id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            "#,
        )
        .bind(workout_id)
        .bind(&entry.exercise_name)
        .bind(entry.sets)
        .bind(entry.reps)
        .bind(entry.duration_seconds)
        .bind(entry.weight)
        .bind(&entry.notes)
        .bind(entry.order_index)
        .fetch_one(&mut **tx)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

#[async_trait]
impl WorkoutStore for PgWorkoutStore {
    async fn create_workout(&self, owner_id: i64, workout: &NewWorkout) -> anyhow::Result<Workout> {
        let mut tx = self.db.begin().await?;
        let row = sqlx::query_as::<_, WorkoutRow>(
            r#"
            INSERT INTO workouts (user_id, title, description, duration_minutes, calories_burned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, duration_minutes, calories_burned,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.duration_minutes)
        .bind(workout.calories_burned)
        .fetch_one(&mut *tx)
        .await?;
        let entries = insert_entries(&mut tx, row.id, &workout.entries).await?;
        tx.commit().await?;
        Ok(Workout::from_row(row, entries))
    }

    async fn get_workout(&self, id: i64) -> anyhow::Result<Option<Workout>> {
        let Some(row) = sqlx::query_as::<_, WorkoutRow>(
            r#"
            SELECT id, user_id, title, description, duration_minutes, calories_burned,
                   created_at, updated_at
            FROM workouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        else {
            return Ok(None);
        };

        let entries = sqlx::query_as::<_, WorkoutEntry>(
            r#"
            SELECT id, exercise_name, sets, reps, duration_seconds, weight, notes, order_index
            FROM workout_entries
            WHERE workout_id = $1
            ORDER BY order_index, id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(Workout::from_row(row, entries)))
    }

    async fn update_workout(&self, id: i64, workout: &NewWorkout) -> anyhow::Result<Option<Workout>> {
        let mut tx = self.db.begin().await?;
        let Some(row) = sqlx::query_as::<_, WorkoutRow>(
            r#"
            UPDATE workouts
            SET title = $1, description = $2, duration_minutes = $3, calories_burned = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING id, user_id, title, description, duration_minutes, calories_burned,
                      created_at, updated_at
            "#,
        )
        .bind(&workout.title)
        .bind(&workout.description)
        .bind(workout.duration_minutes)
        .bind(workout.calories_burned)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM workout_entries WHERE workout_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let entries = insert_entries(&mut tx, id, &workout.entries).await?;
        tx.commit().await?;
        Ok(Some(Workout::from_row(row, entries)))
    }

    async fn delete_workout(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_owner(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM workouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(owner)
    }
}
