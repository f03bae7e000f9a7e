use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Event, Resource, ResultEngine, events, rsvps};

use super::{Engine, MAX_TITLE_LEN, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Create an event with `max_seats` seats.
    pub async fn create_event(
        &self,
        title: &str,
        description: Option<&str>,
        max_seats: i32,
    ) -> ResultEngine<Event> {
        let title = normalize_required_text(title, "title", MAX_TITLE_LEN)?;
        if max_seats <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "max_seats must be positive, got {max_seats}"
            )));
        }

        let event = events::ActiveModel {
            id: ActiveValue::NotSet,
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(normalize_optional_text(description)),
            max_seats: ActiveValue::Set(max_seats),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        tracing::debug!(event_id = event.id, max_seats, "event created");

        Ok(event.into())
    }

    /// Return the event with `id`, if any.
    pub async fn event(&self, id: i32) -> ResultEngine<Option<Event>> {
        Ok(events::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Into::into))
    }

    /// Every event, oldest first.
    pub async fn list_events(&self) -> ResultEngine<Vec<Event>> {
        Ok(events::Entity::find()
            .order_by_asc(events::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Delete an event together with its RSVPs.
    pub async fn delete_event(&self, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            rsvps::Entity::delete_many()
                .filter(rsvps::Column::EventId.eq(id))
                .exec(&db_tx)
                .await?;

            let deleted = events::Entity::delete_by_id(id).exec(&db_tx).await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::NotFound(Resource::Event, id));
            }

            Ok(())
        })
    }
}
