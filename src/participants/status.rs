use axum::{debug_handler, extract::State, http::StatusCode};

use crate::{ChatResult, User};

use super::PresenceManager;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn status(
    State(presence): State<PresenceManager>,
    User(user): User,
) -> ChatResult<StatusCode> {
    presence.heartbeat(user.as_deref()).await?;
    Ok(StatusCode::OK)
}
