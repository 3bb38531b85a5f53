pub mod api;
pub mod benefits;
pub mod db;
pub mod docs;
pub mod error;
pub mod ledger;
pub mod models;
pub mod rescue;
pub mod stats;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}
