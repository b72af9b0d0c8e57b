// Presentation layer - HTTP surface over the dashboard store and data entry
pub mod app_state;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod views;
