pub mod connection;
pub mod models;
pub mod repositories;

pub use connection::{DbPool, get_pool_stats, init_db};
pub use models::{Application, Suggestion};
pub use repositories::*;
