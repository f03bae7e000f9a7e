//! RSVPs table. One row is one seat claimed by one user for one event.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A seat claim linking a user to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rsvp {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "rsvps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Events,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Rsvp {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            event_id: value.event_id,
            created_at: value.created_at,
        }
    }
}
