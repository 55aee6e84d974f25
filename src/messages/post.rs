use axum::{debug_handler, extract::{Query, State}, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{ChatResult, JsonBody, User};

use super::{MessageBody, MessageService};

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    limit: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post_message(
    State(messages): State<MessageService>,
    User(user): User,
    JsonBody(MessageBody { to, text, kind }): JsonBody<MessageBody>,
) -> ChatResult<impl IntoResponse> {
    messages
        .post(user.as_deref(), to.as_deref(), text.as_deref(), kind.as_deref())
        .await?;
    Ok(StatusCode::CREATED)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_messages(
    State(messages): State<MessageService>,
    User(user): User,
    Query(ListQuery { limit }): Query<ListQuery>,
) -> ChatResult<impl IntoResponse> {
    Ok(Json(messages.list(user.as_deref(), limit.as_deref()).await?))
}
