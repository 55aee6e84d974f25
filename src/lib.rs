pub mod appresult;
pub mod clock;
pub mod config;
pub mod db;
pub mod messages;
pub mod participants;
pub mod sweep;
pub mod validate;

use std::{convert::Infallible, sync::Arc};

use axum::{extract::{FromRef, FromRequest, FromRequestParts}, http::request::Parts, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{ChatError, ChatResult};

use clock::Clock;
use db::Store;
use messages::MessageService;
use participants::PresenceManager;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub presence: PresenceManager,
    pub messages: MessageService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            presence: PresenceManager::new(store.clone(), clock.clone()),
            messages: MessageService::new(store, clock),
        }
    }
}

/// Caller identity from the `User` header, if any.
#[derive(Debug, Clone)]
pub struct User(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for User {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.headers
            .get("user")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(User(user))
    }
}

/// JSON request body whose rejections surface as `InvalidInput`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ChatError))]
pub struct JsonBody<T>(pub T);

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(participants::router())
        .merge(messages::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
