use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod doc;
pub mod health;
pub mod items;
pub mod notifications;
pub mod params;
pub mod users;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/item", items::router())
        .nest("/item/admin", admin::router())
        .nest("/item/notifications", notifications::router())
}
