//! The module contains the `Event` struct and the `events` table.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// An event with a fixed number of seats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Upper bound on the number of RSVPs, always positive.
    pub max_seats: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub max_seats: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rsvps::Entity")]
    Rsvps,
}

impl Related<super::rsvps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rsvps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            max_seats: value.max_seats,
            created_at: value.created_at,
        }
    }
}
