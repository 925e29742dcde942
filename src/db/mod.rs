//! Relational stats store: SQLite via Diesel.

mod error;
mod models;
mod repository;
pub(crate) mod schema;

pub use error::DbError;
pub use models::{NewPlayerStat, PlayerStat, StatDelta};
pub use repository::StatsRepository;
