use crate::{Card, CardBackend, CardFilter, Deck, NewCard, Result};
use log::{info, trace};

/// Answers shorter than this many characters get the compact quiz layout
pub const SHORT_ANSWER_LIMIT: usize = 75;

/// Card operations on top of a storage backend. Built once per request.
pub struct CardService {
    pub repo: Box<dyn CardBackend + Send>,
}

/// A card drawn for the memorize view, with its layout hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    pub deck: Deck,
    pub card: Card,
    pub short_answer: bool,
}

impl Quiz {
    #[must_use]
    pub fn new(deck: Deck, card: Card) -> Self {
        let short_answer = is_short_answer(&card.back);
        Self {
            deck,
            card,
            short_answer,
        }
    }
}

impl CardService {
    #[must_use]
    pub fn new(repo: Box<dyn CardBackend + Send>) -> Self {
        Self { repo }
    }

    /// Every card, most recently added first
    ///
    /// # Errors
    ///
    /// Forwards storage errors.
    pub fn list_cards(&self) -> Result<Vec<Card>> {
        self.repo.list(CardFilter::All)
    }

    /// # Errors
    ///
    /// Forwards storage errors.
    pub fn filter_cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        self.repo.list(filter)
    }

    /// Inserts a new unknown card and returns its ID
    ///
    /// # Errors
    ///
    /// Forwards storage errors.
    pub fn add_card(&self, card_type: i64, front: String, back: String) -> Result<i64> {
        let id = self.repo.create(NewCard {
            card_type,
            front,
            back,
        })?;
        info!("Added card #{id} (type {card_type})");
        Ok(id)
    }

    /// Rewrites every mutable field; `known` is never left as it was
    ///
    /// # Errors
    ///
    /// Returns `BackendError::CardNotFound` if `id` doesn't exist.
    pub fn edit_card(
        &self,
        id: i64,
        card_type: i64,
        front: String,
        back: String,
        known: bool,
    ) -> Result<()> {
        self.repo.update(Card {
            id,
            card_type,
            front,
            back,
            known,
        })?;
        info!("Saved card #{id} (known: {known})");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BackendError::CardNotFound` if `id` doesn't exist.
    pub fn delete_card(&self, id: i64) -> Result<()> {
        self.repo.delete(id)?;
        info!("Deleted card #{id}");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `BackendError::CardNotFound` if `id` doesn't exist.
    pub fn mark_known(&self, id: i64) -> Result<()> {
        self.repo.mark_known(id)?;
        info!("Marked card #{id} as known");
        Ok(())
    }

    /// One uniformly random unknown card of the deck, re-queried on every call
    ///
    /// # Errors
    ///
    /// Forwards storage errors.
    pub fn get_card(&self, deck: Deck) -> Result<Option<Card>> {
        self.repo.random_unknown(deck.card_type())
    }

    /// Direct lookup, `None` when there is no such card
    ///
    /// # Errors
    ///
    /// Forwards storage errors other than "not found".
    pub fn get_card_by_id(&self, id: i64) -> Result<Option<Card>> {
        match self.repo.read(id) {
            Ok(card) => Ok(Some(card)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Picks the card to show for a deck: the requested one if an ID is
    /// given (known or not), otherwise a random unknown one. `None` means
    /// there is nothing left to learn.
    ///
    /// # Errors
    ///
    /// Forwards storage errors.
    pub fn quiz(&self, deck: Deck, id: Option<i64>) -> Result<Option<Quiz>> {
        let card = match id {
            Some(id) => self.get_card_by_id(id)?,
            None => self.get_card(deck)?,
        };
        trace!("Drew {:?} for the {deck} deck", card.as_ref().map(|c| c.id));
        Ok(card.map(|card| Quiz::new(deck, card)))
    }
}

// Layout hint only, counted in characters rather than bytes
#[must_use]
pub fn is_short_answer(back: &str) -> bool {
    back.chars().count() < SHORT_ANSWER_LIMIT
}
