mod edit;
mod post;
mod service;

pub use service::MessageService;

use axum::{routing::{get, put}, Router};
use serde::Deserialize;

use crate::AppState;

/// Body of `POST /messages` and `PUT /messages/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    to: Option<String>,
    text: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(post::list_messages).post(post::post_message))
        .route("/messages/{id}", put(edit::edit_message).delete(edit::delete_message))
}
