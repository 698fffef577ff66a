mod models;
pub mod sqlite;

pub use sqlite::{Database, DbError, DbResult};
