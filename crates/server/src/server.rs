use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use std::sync::Arc;

use crate::{ServerError, auth, events, rsvps, user};
use engine::{Engine, EngineError, auth::TokenIssuer};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenIssuer>,
}

impl ServerState {
    pub fn new(engine: Engine, tokens: TokenIssuer) -> Self {
        Self {
            engine: Arc::new(engine),
            tokens: Arc::new(tokens),
        }
    }
}

/// Resolve the bearer token to a user and store it in the request
/// extensions.
///
/// A missing header and a header with another scheme are both rejected
/// as an invalid token.
async fn bearer_auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let auth_header = auth_header.map_err(|rejection| {
        let reason = if rejection.is_missing() {
            "missing bearer token".to_string()
        } else {
            format!("malformed authorization header: {rejection}")
        };
        EngineError::InvalidToken(reason)
    })?;

    let claims = state.tokens.verify(auth_header.token())?;
    let user = state
        .engine
        .user_by_email(&claims.sub)
        .await?
        .ok_or_else(|| EngineError::InvalidToken("unknown subject".to_string()))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let authenticated = Router::new()
        .route("/users/me", get(user::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth));

    Router::new()
        .route("/users/", post(user::user_new).get(user::list))
        .route("/users/{id}", get(user::get))
        .route("/events/", post(events::event_new).get(events::list))
        .route("/events/{id}/rsvps", get(events::rsvps))
        .route("/rsvps/", post(rsvps::rsvp_new))
        .route("/token", post(auth::token))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}
