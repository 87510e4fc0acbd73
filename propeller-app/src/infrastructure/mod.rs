pub mod auth;
pub mod openrouter;
pub mod security;
pub mod store;
pub mod uploads;
