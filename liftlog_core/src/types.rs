//! Core domain types for liftlog.
//!
//! These mirror the records exchanged with the remote workout API:
//! - Users and roles
//! - Workouts, exercises, muscles and sets
//! - Calendars and the snapshots pinned onto them
//! - Request bodies and list query parameters

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Users
// ============================================================================

/// A role granted to a user by the API
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// The authenticated user object returned by the API
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Workouts
// ============================================================================

/// Muscle groups an exercise can be tagged with
///
/// This is a closed set: anything else coming back from the API fails to
/// deserialize instead of leaking into the tallies.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Arms,
    Back,
    Chest,
    Core,
    Heart,
    Legs,
    Shoulders,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 7] = [
        MuscleGroup::Arms,
        MuscleGroup::Back,
        MuscleGroup::Chest,
        MuscleGroup::Core,
        MuscleGroup::Heart,
        MuscleGroup::Legs,
        MuscleGroup::Shoulders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Arms => "arms",
            MuscleGroup::Back => "back",
            MuscleGroup::Chest => "chest",
            MuscleGroup::Core => "core",
            MuscleGroup::Heart => "heart",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Shoulders => "shoulders",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MuscleGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        MuscleGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == wanted)
            .ok_or_else(|| Error::Validation(format!("Unknown muscle group: {}", s)))
    }
}

/// A named muscle targeted by an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Muscle {
    pub name: String,
    #[serde(rename = "muscleGroup")]
    pub muscle_group: MuscleGroup,
}

/// One set of an exercise
///
/// Values are passed through as the API sends them; range checks are the
/// server's business.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub weight: f64,
    pub reps: i64,
}

/// A movement within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub muscles: Vec<Muscle>,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

/// A workout as stored by the API
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateWorkoutRequest {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateWorkoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercises: Option<Vec<Exercise>>,
}

// ============================================================================
// Calendars and Snapshots
// ============================================================================

/// A named calendar owned by a user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCalendarRequest {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateCalendarRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A workout pinned to the instant it was done
///
/// The embedded workout is kept as raw JSON. Older records carry it as a
/// JSON-encoded string, newer ones as an object; [`Snapshot::workout`]
/// handles both and reports anything else as an error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub calendar_id: String,
    pub done: DateTime<Utc>,
    #[serde(default)]
    pub workout: serde_json::Value,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Snapshot {
    /// Parse the embedded workout
    pub fn workout(&self) -> Result<Workout> {
        let parsed = match &self.workout {
            serde_json::Value::String(raw) => serde_json::from_str::<Workout>(raw),
            value => serde_json::from_value::<Workout>(value.clone()),
        };

        parsed.map_err(|e| Error::InvalidSnapshotWorkout {
            snapshot_id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub done: DateTime<Utc>,
    pub workout: Workout,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateSnapshotRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout: Option<Workout>,
}

// ============================================================================
// List Query Parameters
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::Validation(format!("Unknown sort order: {}", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Created,
    Updated,
    Id,
}

impl FromStr for SortColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "created" => Ok(SortColumn::Created),
            "updated" => Ok(SortColumn::Updated),
            "id" => Ok(SortColumn::Id),
            other => Err(Error::Validation(format!("Unknown sort column: {}", other))),
        }
    }
}

/// Pagination and ordering for list endpoints
///
/// Unset fields are left out of the query string.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<SortColumn>,
}

impl ListParams {
    /// Newest-first listing on the given column
    pub fn newest(limit: u32, column: SortColumn) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
            sort: Some(SortOrder::Desc),
            sort_column: Some(column),
        }
    }
}
