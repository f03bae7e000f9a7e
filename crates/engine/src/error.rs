//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a referenced user or event does not exist.
//! - [`DuplicateEmail`] thrown when an email is already registered.
//! - [`DuplicateRsvp`] thrown when a user already holds a seat for an event.
//! - [`CapacityExceeded`] thrown when an event has no seats left.
//! - [`InvalidCredentials`] and [`InvalidToken`] thrown by the login flow.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`DuplicateEmail`]: EngineError::DuplicateEmail
//!  [`DuplicateRsvp`]: EngineError::DuplicateRsvp
//!  [`CapacityExceeded`]: EngineError::CapacityExceeded
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`InvalidToken`]: EngineError::InvalidToken
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Entity kind referenced by [`EngineError::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    User,
    Event,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Event => f.write_str("event"),
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0} with id {1} does not exist")]
    NotFound(Resource, i32),
    #[error("\"{0}\" is already registered")]
    DuplicateEmail(String),
    #[error("user {0} has already RSVPed to event {1}")]
    DuplicateRsvp(i32, i32),
    #[error("event \"{0}\" is already full")]
    CapacityExceeded(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a, x), Self::NotFound(b, y)) => a == b && x == y,
            (Self::DuplicateEmail(a), Self::DuplicateEmail(b)) => a == b,
            (Self::DuplicateRsvp(a, x), Self::DuplicateRsvp(b, y)) => a == b && x == y,
            (Self::CapacityExceeded(a), Self::CapacityExceeded(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::InvalidToken(a), Self::InvalidToken(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            (Self::Task(a), Self::Task(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
