//! Form checks applied before a request is sent.
//!
//! The server remains the authority; these only catch the obvious mistakes
//! early with a readable message.

use crate::{
    CreateCalendarRequest, CreateUserRequest, CreateWorkoutRequest, Error, Exercise, LoginRequest,
    Result, UpdateWorkoutRequest,
};

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Validation(message.into()))
    }
}

fn exercises(exercises: &[Exercise]) -> Result<()> {
    require(!exercises.is_empty(), "At least one exercise is required")?;
    require(
        exercises
            .iter()
            .all(|e| !e.name.trim().is_empty() && !e.sets.is_empty()),
        "All exercises must have a name and at least one set",
    )
}

pub fn workout(request: &CreateWorkoutRequest) -> Result<()> {
    require(!request.name.trim().is_empty(), "Workout name is required")?;
    exercises(&request.exercises)
}

/// Only the fields being changed are checked
pub fn workout_update(request: &UpdateWorkoutRequest) -> Result<()> {
    if let Some(name) = &request.name {
        require(!name.trim().is_empty(), "Workout name is required")?;
    }
    match &request.exercises {
        Some(list) => exercises(list),
        None => Ok(()),
    }
}

pub fn calendar(request: &CreateCalendarRequest) -> Result<()> {
    require(!request.name.trim().is_empty(), "Calendar name is required")
}

pub fn login(request: &LoginRequest) -> Result<()> {
    require(!request.username.trim().is_empty(), "Username is required")?;
    require(!request.password.is_empty(), "Password is required")
}

pub fn registration(request: &CreateUserRequest) -> Result<()> {
    require(!request.username.trim().is_empty(), "Username is required")?;
    require(!request.password.is_empty(), "Password is required")?;
    require(request.email.contains('@'), "A valid email address is required")
}
