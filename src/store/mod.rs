//! Persistence boundary for registration records.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{MemoryStore, UserStore};
