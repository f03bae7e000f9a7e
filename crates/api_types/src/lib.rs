//! Request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    /// Public view of a user. The password is never serialized.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: i32,
        pub name: String,
        pub email: String,
        pub created_at: DateTime<Utc>,
    }
}

pub mod event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventNew {
        pub title: String,
        #[serde(default)]
        pub description: Option<String>,
        pub max_seats: i32,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Event {
        pub id: i32,
        pub title: String,
        pub description: Option<String>,
        pub max_seats: i32,
        pub created_at: DateTime<Utc>,
    }
}

pub mod rsvp {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RsvpNew {
        pub user_id: i32,
        pub event_id: i32,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Rsvp {
        pub id: i32,
        pub user_id: i32,
        pub event_id: i32,
        pub created_at: DateTime<Utc>,
    }
}

pub mod auth {
    use super::*;

    /// Login credentials, sent as query parameters or an urlencoded form.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Token {
        pub access_token: String,
        /// Always `bearer`.
        pub token_type: String,
    }
}
