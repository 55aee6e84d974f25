use axum::{debug_handler, extract::{Path, State}, http::StatusCode};

use crate::{ChatResult, JsonBody, User};

use super::{MessageBody, MessageService};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn edit_message(
    State(messages): State<MessageService>,
    Path(id): Path<String>,
    User(user): User,
    JsonBody(MessageBody { to, text, kind }): JsonBody<MessageBody>,
) -> ChatResult<StatusCode> {
    messages
        .edit(&id, user.as_deref(), to.as_deref(), text.as_deref(), kind.as_deref())
        .await?;
    Ok(StatusCode::OK)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_message(
    State(messages): State<MessageService>,
    Path(id): Path<String>,
    User(user): User,
) -> ChatResult<StatusCode> {
    messages.delete(&id, user.as_deref()).await?;
    Ok(StatusCode::OK)
}
