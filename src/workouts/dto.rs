use serde::Deserialize;

use crate::workouts::repo_types::{NewWorkout, Workout, WorkoutEntry};

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: i32,
    #[serde(default)]
    pub calories_burned: i32,
    #[serde(default)]
    pub entries: Vec<WorkoutEntry>,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    pub calories_burned: Option<i32>,
    pub entries: Option<Vec<WorkoutEntry>>,
}

impl From<CreateWorkoutRequest> for NewWorkout {
    fn from(r: CreateWorkoutRequest) -> Self {
        Self {
            title: r.title,
            description: r.description,
            duration_minutes: r.duration_minutes,
            calories_burned: r.calories_burned,
            entries: r.entries,
        }
    }
}

impl UpdateWorkoutRequest {
    pub fn apply_to(self, existing: Workout) -> NewWorkout {
        NewWorkout {
            title: self.title.unwrap_or(existing.title),
            description: self.description.unwrap_or(existing.description),
            duration_minutes: self.duration_minutes.unwrap_or(existing.duration_minutes),
            calories_burned: self.calories_burned.unwrap_or(existing.calories_burned),
            entries: self.entries.unwrap_or(existing.entries),
        }
    }
}

const MAX_TITLE_LEN: usize = 255;
const MAX_EXERCISE_NAME_LEN: usize = 255;

pub(crate) fn validate_workout(w: &mut NewWorkout) -> Result<(), String> {
    w.title = w.title.trim().to_string();
    if w.title.is_empty() {
        return Err("title is required".into());
    }
    if w.title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {MAX_TITLE_LEN} characters long"));
    }
    if w.duration_minutes < 0 {
        return Err("duration_minutes must not be negative".into());
    }
    if w.calories_burned < 0 {
        return Err("calories_burned must not be negative".into());
    }
    for (i, entry) in w.entries.iter_mut().enumerate() {
        entry.exercise_name = entry.exercise_name.trim().to_string();
        if entry.exercise_name.is_empty() {
            return Err(format!("entries[{i}]: exercise_name is required"));
        }
        if entry.exercise_name.chars().count() > MAX_EXERCISE_NAME_LEN {
            return Err(format!(
                "entries[{i}]: exercise_name must be at most {MAX_EXERCISE_NAME_LEN} characters long"
            ));
        }
        if entry.sets <= 0 {
            return Err(format!("entries[{i}]: sets must be positive"));
        }
        match (entry.reps, entry.duration_seconds) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(format!(
                    "entries[{i}]: exactly one of reps or duration_seconds is required"
                ))
            }
        }
    }
    Ok(())
}
