//! RSVP admission.
//!
//! A seat is granted only when the user and the event exist, the event still
//! has a free seat and the user does not already hold one. The checks and the
//! insert run in one transaction that opens by writing the event row, so two
//! admissions for the same event never interleave.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
    sea_query::{Expr, SimpleExpr},
};

use crate::{EngineError, Resource, ResultEngine, Rsvp, events, rsvps, users};

use super::{Engine, is_unique_violation, with_tx};

impl Engine {
    /// Claim a seat of `event_id` for `user_id`.
    ///
    /// Errors are reported in a fixed order: missing user, missing event,
    /// full event, then duplicate RSVP.
    pub async fn create_rsvp(&self, user_id: i32, event_id: i32) -> ResultEngine<Rsvp> {
        with_tx!(self, |db_tx| {
            let event_locked = self.lock_event(&db_tx, event_id).await?;

            let user = users::Entity::find_by_id(user_id).one(&db_tx).await?;
            if user.is_none() {
                return Err(EngineError::NotFound(Resource::User, user_id));
            }
            let event = if event_locked {
                events::Entity::find_by_id(event_id).one(&db_tx).await?
            } else {
                None
            };
            let Some(event) = event else {
                return Err(EngineError::NotFound(Resource::Event, event_id));
            };

            let taken = rsvps::Entity::find()
                .filter(rsvps::Column::EventId.eq(event_id))
                .count(&db_tx)
                .await?;
            if taken >= u64::try_from(event.max_seats).unwrap_or(0) {
                return Err(EngineError::CapacityExceeded(event.title));
            }

            let existing = rsvps::Entity::find()
                .filter(rsvps::Column::UserId.eq(user_id))
                .filter(rsvps::Column::EventId.eq(event_id))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::DuplicateRsvp(user_id, event_id));
            }

            let inserted = rsvps::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                event_id: ActiveValue::Set(event_id),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await;
            let rsvp = match inserted {
                Ok(model) => model,
                Err(err) if is_unique_violation(&err) => {
                    return Err(EngineError::DuplicateRsvp(user_id, event_id));
                }
                Err(err) => return Err(err.into()),
            };
            tracing::debug!(user_id, event_id, seats_taken = taken + 1, "rsvp admitted");

            Ok(rsvp.into())
        })
    }

    /// Every RSVP of `event_id`, oldest first. Unknown events have none.
    pub async fn list_rsvps(&self, event_id: i32) -> ResultEngine<Vec<Rsvp>> {
        Ok(rsvps::Entity::find()
            .filter(rsvps::Column::EventId.eq(event_id))
            .order_by_asc(rsvps::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Write the event row without changing it.
    ///
    /// On PostgreSQL this takes the row lock, on SQLite the database write
    /// lock; either way concurrent admissions for the event queue up behind
    /// this transaction. Returns whether the event exists.
    async fn lock_event(&self, db_tx: &DatabaseTransaction, event_id: i32) -> ResultEngine<bool> {
        let res = events::Entity::update_many()
            .col_expr(
                events::Column::MaxSeats,
                SimpleExpr::from(Expr::col(events::Column::MaxSeats)),
            )
            .filter(events::Column::Id.eq(event_id))
            .exec(db_tx)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
