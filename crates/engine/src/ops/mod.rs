use sea_orm::{DatabaseConnection, DbErr, SqlErr};

use crate::{EngineError, ResultEngine, auth::DEFAULT_PASSWORD_ITERATIONS};

mod events;
mod rsvps;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 150;
const MAX_TITLE_LEN: usize = 200;

/// Data-access handle over the users, events and RSVPs tables.
///
/// The engine owns no state besides the connection pool, so one instance is
/// shared by every request.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    password_iterations: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_text(value: &str, label: &str, max_len: usize) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    if trimmed.chars().count() > max_len {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trim and lowercase an email, rejecting anything not shaped like
/// `local@domain.tld`.
fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required_text(value, "email", MAX_EMAIL_LEN)?.to_lowercase();
    let invalid = || EngineError::InvalidInput(format!("\"{email}\" is not a valid email"));

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(email)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    password_iterations: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// PBKDF2 rounds used for newly registered passwords.
    pub fn password_iterations(mut self, iterations: u32) -> EngineBuilder {
        self.password_iterations = iterations;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.password_iterations == 0 {
            return Err(EngineError::InvalidInput(
                "password iterations must be positive".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            password_iterations: self.password_iterations,
        })
    }
}
