use super::{BackendError, Card, CardBackend, CardError, CardFilter, NewCard, Result};
use log::{debug, warn};
use rusqlite::{Connection, Error as SqliteError, ErrorCode, OptionalExtension, Row, params};
use std::cell::OnceCell;

const CARD_COLUMNS: &str = "id, type, front, back, known";

/// Card storage in a `SQLite` database file.
///
/// The connection is opened on first use and cached until the backend is
/// dropped, which closes it. One backend is built per request, so every
/// request gets its own connection and releases it on every exit path.
#[derive(Debug)]
pub struct SqliteBackend {
    path: String,
    connection: OnceCell<Connection>,
}

impl SqliteBackend {
    /// Creates a backend for the database at `path` without touching the file yet.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            connection: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.connection.get().is_some()
    }

    /// Opens the database and creates the `cards` table if it doesn't exist.
    /// Used at startup to fail fast on a bad path.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::OpenFailed` or `BackendError::TableCreationError`.
    pub fn ensure_schema(&self) -> Result<()> {
        self.connection().map(|_| ())
    }

    // First access wins; later calls reuse the cached connection
    fn connection(&self) -> Result<&Connection> {
        if let Some(connection) = self.connection.get() {
            return Ok(connection);
        }
        let connection = open(&self.path)?;
        Ok(self.connection.get_or_init(|| connection))
    }
}

impl Drop for SqliteBackend {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            match connection.close() {
                Ok(()) => debug!("Closed database connection to '{}'", self.path),
                Err((_, e)) => warn!("Failed closing database connection to '{}': {e}", self.path),
            }
        }
    }
}

fn open(path: &str) -> Result<Connection> {
    debug!("Opening database connection to '{path}'");
    let connection = Connection::open(path).map_err(|source| BackendError::OpenFailed {
        path: path.to_string(),
        source,
    })?;

    // Create cards table if it doesn't exist
    connection
        .execute(
            "
            CREATE TABLE IF NOT EXISTS cards (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                type  INTEGER NOT NULL,
                front TEXT NOT NULL,
                back  TEXT NOT NULL,
                known INTEGER NOT NULL DEFAULT 0
            )
            ",
            [],
        )
        .map_err(|e| {
            warn!("Failed creating cards table: {e}");
            BackendError::TableCreationError
        })?;
    Ok(connection)
}

/// Maps a `rusqlite::Error` into a `CardError`, wrapping known SQLite-specific codes into domain-specific variants.
fn map_sqlite_error(e: rusqlite::Error) -> CardError {
    let backend = match e {
        SqliteError::SqliteFailure(code, message) => match code.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => BackendError::DatabaseBusy,
            ErrorCode::PermissionDenied | ErrorCode::ReadOnly => BackendError::PermissionDenied,
            ErrorCode::NotADatabase => BackendError::NotADatabase,
            ErrorCode::SchemaChanged => BackendError::SchemaChanged,
            ErrorCode::DatabaseCorrupt | ErrorCode::SystemIoFailure => {
                BackendError::DatabaseCorruptOrIo
            }
            ErrorCode::ConstraintViolation => BackendError::ConstraintViolation(
                message.unwrap_or_else(|| "unknown constraint".to_string()),
            ),
            _ => BackendError::Other(anyhow::anyhow!("SQLite error: {code:?}")),
        },
        other => BackendError::Other(anyhow::Error::new(other)),
    };
    CardError::Backend(backend)
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        card_type: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        known: row.get(4)?,
    })
}

// Fixed predicate per filter, never built from user input
const fn where_clause(filter: CardFilter) -> &'static str {
    match filter {
        CardFilter::All => "WHERE 1 = 1",
        CardFilter::General => "WHERE type = 1",
        CardFilter::Code => "WHERE type = 2",
        CardFilter::Known => "WHERE known = 1",
        CardFilter::Unknown => "WHERE known = 0",
    }
}

// Zero affected rows means the ID didn't exist
fn expect_row(rows: usize, id: i64) -> Result<()> {
    if rows == 0 {
        Err(CardError::Backend(BackendError::CardNotFound(id)))
    } else {
        Ok(())
    }
}

impl CardBackend for SqliteBackend {
    fn create(&self, card: NewCard) -> Result<i64> {
        let connection = self.connection()?;
        connection
            .execute(
                "INSERT INTO cards (type, front, back) VALUES (?1, ?2, ?3)",
                params![card.card_type, card.front, card.back],
            )
            .map_err(map_sqlite_error)?;
        Ok(connection.last_insert_rowid())
    }

    fn read(&self, id: i64) -> Result<Card> {
        self.connection()?
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1 LIMIT 1"),
                [id],
                card_from_row,
            )
            .optional()
            .map_err(map_sqlite_error)?
            .ok_or(CardError::Backend(BackendError::CardNotFound(id)))
    }

    fn update(&self, card: Card) -> Result<()> {
        let rows = self
            .connection()?
            .execute(
                "UPDATE cards SET type = ?1, front = ?2, back = ?3, known = ?4 WHERE id = ?5",
                params![card.card_type, card.front, card.back, card.known, card.id],
            )
            .map_err(map_sqlite_error)?;
        expect_row(rows, card.id)
    }

    fn mark_known(&self, id: i64) -> Result<()> {
        let rows = self
            .connection()?
            .execute("UPDATE cards SET known = 1 WHERE id = ?1", [id])
            .map_err(map_sqlite_error)?;
        expect_row(rows, id)
    }

    fn delete(&self, id: i64) -> Result<()> {
        let rows = self
            .connection()?
            .execute("DELETE FROM cards WHERE id = ?1", [id])
            .map_err(map_sqlite_error)?;
        expect_row(rows, id)
    }

    fn list(&self, filter: CardFilter) -> Result<Vec<Card>> {
        let mut stmt = self
            .connection()?
            .prepare(&format!(
                "SELECT {CARD_COLUMNS} FROM cards {} ORDER BY id DESC",
                where_clause(filter)
            ))
            .map_err(map_sqlite_error)?;

        let cards_iter = stmt.query_map([], card_from_row).map_err(map_sqlite_error)?;

        cards_iter
            .collect::<std::result::Result<_, _>>()
            .map_err(map_sqlite_error)
    }

    fn random_unknown(&self, card_type: i64) -> Result<Option<Card>> {
        self.connection()?
            .query_row(
                &format!(
                    "SELECT {CARD_COLUMNS} FROM cards
                     WHERE type = ?1 AND known = 0
                     ORDER BY RANDOM()
                     LIMIT 1"
                ),
                [card_type],
                card_from_row,
            )
            .optional()
            .map_err(map_sqlite_error)
    }
}
