pub mod admin;
pub mod auth;
pub mod rescue;
pub mod stats;
pub mod subscriptions;
pub mod tokens;
