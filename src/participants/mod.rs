mod presence;
mod register;
mod status;

pub use presence::{PresenceManager, JOINED, LEFT};

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/participants", get(register::list_participants).post(register::register))
        .route("/status", post(status::status))
}
