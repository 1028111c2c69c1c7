//! Workspace snapshots and their serialized form.
//!
//! Local storage and the remote document both hold the same encoding: a
//! JSON array of cards.

use crate::card::Card;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One complete workspace state at a point in time.
///
/// Snapshots are never mutated after creation, only replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    /// Cards in display order.
    pub cards: Vec<Card>,
    /// Set by whichever side last wrote the snapshot.
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceSnapshot {
    /// Creates a snapshot.
    pub fn new(cards: Vec<Card>, updated_at: DateTime<Utc>) -> Self {
        Self { cards, updated_at }
    }

    /// Returns the number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns true if the snapshot holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Encodes cards as a JSON array.
///
/// # Errors
///
/// Returns an error if a card holds a non-finite coordinate, since JSON
/// would write it as `null` and the array could not be read back.
pub fn encode_cards(cards: &[Card]) -> CoreResult<Vec<u8>> {
    if let Some(card) = cards.iter().find(|card| !card.is_finite()) {
        return Err(CoreError::invalid_snapshot(format!(
            "card {} has non-finite geometry",
            card.id
        )));
    }
    Ok(serde_json::to_vec(cards)?)
}

/// Decodes a JSON array of cards.
///
/// # Errors
///
/// Returns an error if the bytes are not a card array or if two cards share
/// an id.
pub fn decode_cards(bytes: &[u8]) -> CoreResult<Vec<Card>> {
    let cards: Vec<Card> = serde_json::from_slice(bytes)?;

    let mut seen = HashSet::with_capacity(cards.len());
    for card in &cards {
        if !seen.insert(&card.id) {
            return Err(CoreError::invalid_snapshot(format!(
                "duplicate card id {}",
                card.id
            )));
        }
    }

    Ok(cards)
}
