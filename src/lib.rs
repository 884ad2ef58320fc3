#![deny(clippy::cargo)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(clippy::pedantic)]

use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use thiserror::Error;

pub mod app;
pub mod auth;
pub mod backends;
pub mod setup;
pub mod ui;
pub mod web;

// More convenient Result type
pub type Result<T> = std::result::Result<T, CardError>;

/// A single flashcard row.
///
/// `card_type` is kept as the raw stored integer: nothing stops a caller from
/// storing a value outside of [`Deck`], such cards are simply never drawn in a quiz.
#[derive(Tabled, Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: i64,
    #[tabled(rename = "type")]
    pub card_type: i64,
    pub front: String,
    pub back: String,
    pub known: bool,
}

// Card data before storage has assigned an ID. New cards are never known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub card_type: i64,
    pub front: String,
    pub back: String,
}

/// A quiz deck: all cards sharing a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deck {
    General = 1,
    Code = 2,
}

/// Both decks in display order
pub const ALL_DECKS: [Deck; 2] = [Deck::General, Deck::Code];

impl Deck {
    /// The integer stored in the `type` column for cards of this deck
    #[must_use]
    pub const fn card_type(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Code => "code",
        }
    }

    /// Maps a stored `type` value back to its deck, if it has one
    #[must_use]
    pub const fn from_card_type(card_type: i64) -> Option<Self> {
        match card_type {
            1 => Some(Self::General),
            2 => Some(Self::Code),
            _ => None,
        }
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Deck {
    type Err = CardValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_DECKS
            .into_iter()
            .find(|deck| deck.name() == s)
            .ok_or_else(|| CardValidationError::UnknownDeck(s.to_string()))
    }
}

/// The fixed set of predicates a card listing can be narrowed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardFilter {
    All,
    General,
    Code,
    Known,
    Unknown,
}

/// All filters in display order
pub const ALL_FILTERS: [CardFilter; 5] = [
    CardFilter::All,
    CardFilter::General,
    CardFilter::Code,
    CardFilter::Known,
    CardFilter::Unknown,
];

impl CardFilter {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::General => "general",
            Self::Code => "code",
            Self::Known => "known",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CardFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardFilter {
    type Err = CardValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_FILTERS
            .into_iter()
            .find(|filter| filter.name() == s)
            .ok_or_else(|| CardValidationError::UnknownFilter(s.to_string()))
    }
}

/// Trait to be implemented by all backends that store and retrieve cards
pub trait CardBackend {
    /// Stores a new, unknown card and returns the ID assigned by storage
    ///
    /// # Errors
    ///
    /// Returns an error if the card could not be inserted
    fn create(&self, card: NewCard) -> Result<i64>;

    /// Fetches a card by ID regardless of its known state
    ///
    /// # Errors
    ///
    /// Returns `BackendError::CardNotFound` if no card has this ID, or another error if the query fails
    fn read(&self, id: i64) -> Result<Card>;

    /// Overwrites type, front, back and known of an existing card
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the card is not found
    fn update(&self, card: Card) -> Result<()>;

    /// Sets `known` on an existing card
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the card is not found
    fn mark_known(&self, id: i64) -> Result<()>;

    /// Deletes a card by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the card is not found or the deletion fails
    fn delete(&self, id: i64) -> Result<()>;

    /// Returns every card passing `filter`, most recently added first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    fn list(&self, filter: CardFilter) -> Result<Vec<Card>>;

    /// Picks one uniformly random unknown card of the given type
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    fn random_unknown(&self, card_type: i64) -> Result<Option<Card>>;
}

// Enum for all possible validation or backend-related errors
#[derive(Debug, Error)]
pub enum CardError {
    #[error(transparent)]
    Validation(#[from] CardValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CardError {
    /// True when the error only means that the requested card does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend(BackendError::CardNotFound(_)))
    }
}

// Enum for names that don't map to a filter, deck or route
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardValidationError {
    #[error("Unknown filter: '{0}'. Expected one of: all, general, code, known, unknown")]
    UnknownFilter(String),

    #[error("Unknown deck: '{0}'. Expected general or code")]
    UnknownDeck(String),

    #[error("Unknown route name: '{0}'")]
    UnknownRoute(String),
}

// Enum for all possible storage errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed opening database at '{path}': {source}")]
    OpenFailed {
        path: String,
        source: rusqlite::Error,
    },

    #[error("Failed creating `cards` table in database")]
    TableCreationError,

    #[error("Database is locked or busy")]
    DatabaseBusy,

    #[error("Database corruption or file I/O error")]
    DatabaseCorruptOrIo,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("Database file is not a valid SQLite database")]
    NotADatabase,

    #[error("Database schema has changed unexpectedly")]
    SchemaChanged,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("No card with ID: {0}")]
    CardNotFound(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Used as fallback
}
