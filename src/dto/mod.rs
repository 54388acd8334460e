pub mod admin;
pub mod auth;
pub mod items;
pub mod notifications;
pub mod orders;
