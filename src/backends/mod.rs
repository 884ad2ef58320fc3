pub mod sqlite;

pub use sqlite::SqliteBackend;

pub use crate::{BackendError, Card, CardBackend, CardError, CardFilter, NewCard, Result};
