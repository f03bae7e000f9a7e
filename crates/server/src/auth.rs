//! Login endpoint.

use api_types::auth::{Login, Token};
use axum::{
    Form, Json,
    extract::{Query, State, rejection::{FormRejection, QueryRejection}},
};

use crate::{ServerError, server::ServerState};

/// Exchange an email/password pair for a bearer token.
///
/// Credentials are read from the query string first, then from an
/// urlencoded body.
pub async fn token(
    State(state): State<ServerState>,
    query: Result<Query<Login>, QueryRejection>,
    form: Result<Form<Login>, FormRejection>,
) -> Result<Json<Token>, ServerError> {
    let login = match (query, form) {
        (Ok(Query(login)), _) | (_, Ok(Form(login))) => login,
        _ => {
            return Err(ServerError::Generic(
                "email and password are required".to_string(),
            ));
        }
    };

    let user = state
        .engine
        .authenticate(&login.email, &login.password)
        .await?;
    let access_token = state.tokens.issue(&user.email)?;
    tracing::info!(user_id = user.id, "access token issued");

    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}
