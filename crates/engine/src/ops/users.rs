use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, Resource, ResultEngine, User, auth, rsvps, users};

use super::{Engine, MAX_NAME_LEN, is_unique_violation, normalize_email, normalize_required_text, with_tx};

impl Engine {
    /// Insert a user whose password is already hashed.
    ///
    /// Email uniqueness is left to the storage constraint: a conflicting
    /// insert is reported as [`EngineError::DuplicateEmail`].
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> ResultEngine<User> {
        let name = normalize_required_text(name, "name", MAX_NAME_LEN)?;
        let email = normalize_email(email)?;

        let user = users::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(name),
            email: ActiveValue::Set(email.clone()),
            password: ActiveValue::Set(password_hash.to_string()),
            created_at: ActiveValue::Set(Utc::now()),
        };

        match user.insert(&self.database).await {
            Ok(model) => {
                tracing::debug!(user_id = model.id, "user created");
                Ok(model.into())
            }
            Err(err) if is_unique_violation(&err) => Err(EngineError::DuplicateEmail(email)),
            Err(err) => Err(err.into()),
        }
    }

    /// Hash `password` and create the user.
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ResultEngine<User> {
        if password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let iterations = self.password_iterations;
        let password = password.to_string();
        let hash =
            tokio::task::spawn_blocking(move || auth::hash_password(&password, iterations)).await?;

        self.create_user(name, email, &hash).await
    }

    /// Return the user with `id`, if any.
    pub async fn user(&self, id: i32) -> ResultEngine<Option<User>> {
        Ok(users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .map(Into::into))
    }

    /// Return the user registered with `email`, if any.
    pub async fn user_by_email(&self, email: &str) -> ResultEngine<Option<User>> {
        Ok(self.user_model_by_email(email).await?.map(Into::into))
    }

    async fn user_model_by_email(&self, email: &str) -> ResultEngine<Option<users::Model>> {
        let email = email.trim().to_lowercase();
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?)
    }

    /// Every user, oldest first.
    pub async fn list_users(&self) -> ResultEngine<Vec<User>> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Check an email/password pair.
    ///
    /// Unknown emails and wrong passwords both yield
    /// [`EngineError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, password: &str) -> ResultEngine<User> {
        let Some(model) = self.user_model_by_email(email).await? else {
            return Err(EngineError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored = model.password.clone();
        let verified =
            tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored)).await?;
        if !verified {
            tracing::debug!(user_id = model.id, "password mismatch");
            return Err(EngineError::InvalidCredentials);
        }

        Ok(model.into())
    }

    /// Delete a user together with its RSVPs.
    pub async fn delete_user(&self, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            // The FK cascades as well; deleting explicitly keeps the outcome
            // independent of the backend's foreign key enforcement.
            rsvps::Entity::delete_many()
                .filter(rsvps::Column::UserId.eq(id))
                .exec(&db_tx)
                .await?;

            let deleted = users::Entity::delete_by_id(id).exec(&db_tx).await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::NotFound(Resource::User, id));
            }

            Ok(())
        })
    }
}
