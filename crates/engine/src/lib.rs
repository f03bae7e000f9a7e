//! Event RSVP engine.
//!
//! The engine owns the persistent model (users, events, RSVPs), the RSVP
//! admission rules and the auth primitives used by the login flow. Every
//! operation goes through [`Engine`], which wraps the database connection.

pub use error::{EngineError, Resource};
pub use events::Event;
pub use ops::{Engine, EngineBuilder};
pub use rsvps::Rsvp;
pub use users::User;

pub mod auth;
pub mod events;
pub mod rsvps;
pub mod users;

mod error;
mod ops;

pub type ResultEngine<T> = Result<T, EngineError>;
