//! The local replica store.

use crate::card::{Card, CardBody, CardId, CardVariant, Position, Size};
use crate::command::{apply_command, Command};
use crate::config::Config;
use crate::error::CoreResult;
use crate::snapshot::{decode_cards, encode_cards};
use cardspace_storage::{BlobStore, InMemoryBlobStore};
use parking_lot::Mutex;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A point-in-time copy of the replica.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaSnapshot {
    /// Cards in display order.
    pub cards: Vec<Card>,
    /// Local mutation counter at the time of the copy.
    pub revision: u64,
}

struct ReplicaInner {
    cards: Vec<Card>,
    store: Box<dyn BlobStore>,
    revision: u64,
}

/// The authoritative in-memory workspace for a running session.
///
/// All reads and writes go through this handle; there is no global state.
/// Every mutation is written through to local storage before the call
/// returns, and if that write fails the in-memory cards are left as they
/// were. The on-disk copy therefore never lags the in-memory copy.
///
/// Commands are serialized by an internal lock, so the store can be shared
/// behind an `Arc` between the input layer and the sync engine.
///
/// # Example
///
/// ```rust
/// use cardspace_core::{CardVariant, Position, ReplicaStore};
///
/// let replica = ReplicaStore::open_in_memory().unwrap();
/// let id = replica.create_card(CardVariant::Text, Position::new(0.0, 0.0)).unwrap();
/// replica.move_card(&id, 10.0, 20.0).unwrap();
/// assert_eq!(replica.card(&id).unwrap().position, Position::new(10.0, 20.0));
/// ```
pub struct ReplicaStore {
    config: Config,
    inner: Mutex<ReplicaInner>,
}

impl ReplicaStore {
    /// Loads the replica from local storage.
    ///
    /// A missing blob yields an empty workspace. A blob that cannot be
    /// decoded is logged and also yields an empty workspace; it is left in
    /// place until the next command overwrites it.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be read.
    pub fn load(config: Config, store: Box<dyn BlobStore>) -> CoreResult<Self> {
        let cards = match store.get(&config.workspace_key)? {
            None => {
                debug!(key = %config.workspace_key, "no stored workspace, starting empty");
                Vec::new()
            }
            Some(bytes) => match decode_cards(&bytes) {
                Ok(cards) => {
                    debug!(count = cards.len(), "loaded workspace");
                    cards
                }
                Err(e) => {
                    warn!(
                        key = %config.workspace_key,
                        error = %e,
                        "stored workspace is unreadable, starting empty"
                    );
                    Vec::new()
                }
            },
        };

        Ok(Self {
            config,
            inner: Mutex::new(ReplicaInner {
                cards,
                store,
                revision: 0,
            }),
        })
    }

    /// Opens an empty replica backed by memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the default workspace key is rejected.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::load(Config::default(), Box::new(InMemoryBlobStore::new()))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Applies a command and persists the result.
    ///
    /// Returns `true` if the workspace changed. Commands that change nothing
    /// (unknown ids, mismatched variants) are not persisted and do not count
    /// as local mutations.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting fails; the in-memory workspace is
    /// then unchanged.
    pub fn apply(&self, command: Command) -> CoreResult<bool> {
        let mut inner = self.inner.lock();

        let mut next = inner.cards.clone();
        if !apply_command(&mut next, &command) {
            debug!(command = command.name(), "command changed nothing");
            return Ok(false);
        }

        self.commit(&mut inner, next)?;
        inner.revision += 1;
        debug!(
            command = command.name(),
            revision = inner.revision,
            "applied command"
        );
        Ok(true)
    }

    /// Creates a card and returns its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn create_card(&self, variant: CardVariant, position: Position) -> CoreResult<CardId> {
        let id = CardId::generate();
        self.apply(Command::Create {
            id: id.clone(),
            variant,
            position,
        })?;
        Ok(id)
    }

    /// Moves a card.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn move_card(&self, id: &CardId, x: f64, y: f64) -> CoreResult<()> {
        self.apply(Command::Move {
            id: id.clone(),
            x,
            y,
        })
        .map(drop)
    }

    /// Replaces a card's title.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn set_title(&self, id: &CardId, title: impl Into<String>) -> CoreResult<()> {
        self.apply(Command::SetTitle {
            id: id.clone(),
            title: title.into(),
        })
        .map(drop)
    }

    /// Replaces a card's content.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn set_content(&self, id: &CardId, content: impl Into<String>) -> CoreResult<()> {
        self.apply(Command::SetContent {
            id: id.clone(),
            content: content.into(),
        })
        .map(drop)
    }

    /// Replaces a card's structured payload.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn set_structured_payload(&self, id: &CardId, body: CardBody) -> CoreResult<()> {
        self.apply(Command::SetPayload {
            id: id.clone(),
            body,
        })
        .map(drop)
    }

    /// Resizes a resizable card.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn resize_card(&self, id: &CardId, width: f64, height: f64) -> CoreResult<()> {
        self.apply(Command::Resize {
            id: id.clone(),
            size: Size::new(width, height),
        })
        .map(drop)
    }

    /// Links `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn connect(&self, from: &CardId, to: &CardId) -> CoreResult<()> {
        self.apply(Command::Connect {
            from: from.clone(),
            to: to.clone(),
        })
        .map(drop)
    }

    /// Removes the link from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn disconnect(&self, from: &CardId, to: &CardId) -> CoreResult<()> {
        self.apply(Command::Disconnect {
            from: from.clone(),
            to: to.clone(),
        })
        .map(drop)
    }

    /// Deletes a card.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn delete_card(&self, id: &CardId) -> CoreResult<()> {
        self.apply(Command::Delete { id: id.clone() }).map(drop)
    }

    /// Removes every card.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn clear_workspace(&self) -> CoreResult<()> {
        self.apply(Command::Clear).map(drop)
    }

    /// Replaces the whole workspace as a local edit (used by imports).
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn import(&self, cards: Vec<Card>) -> CoreResult<bool> {
        let mut inner = self.inner.lock();
        if inner.cards == cards {
            return Ok(false);
        }
        self.commit(&mut inner, cards)?;
        inner.revision += 1;
        Ok(true)
    }

    /// Writes a reconciliation result into the replica.
    ///
    /// Each merged card replaces the current card with the same id. Cards
    /// currently present but absent from `merged` were created after the
    /// merge read its snapshot; they are kept after the merged cards.
    ///
    /// Merged cards with non-finite geometry are dropped, so a current card
    /// with the same id survives as if it were created late.
    ///
    /// This is not a local mutation: the revision counter is unchanged.
    /// Returns `true` if the workspace changed.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the in-memory workspace is then
    /// unchanged.
    pub fn apply_merge(&self, mut merged: Vec<Card>) -> CoreResult<bool> {
        let mut inner = self.inner.lock();

        merged.retain(|card| {
            let ok = card.is_finite();
            if !ok {
                warn!(card = %card.id, "dropping merged card with non-finite geometry");
            }
            ok
        });

        let merged_ids: HashSet<&CardId> = merged.iter().map(|c| &c.id).collect();
        let late: Vec<Card> = inner
            .cards
            .iter()
            .filter(|c| !merged_ids.contains(&c.id))
            .cloned()
            .collect();

        let mut next = merged;
        next.extend(late);

        if next == inner.cards {
            return Ok(false);
        }
        self.commit(&mut inner, next)?;
        debug!(count = inner.cards.len(), "applied merge result");
        Ok(true)
    }

    /// Returns the current cards in display order.
    pub fn current_cards(&self) -> Vec<Card> {
        self.inner.lock().cards.clone()
    }

    /// Returns a copy of one card.
    pub fn card(&self, id: &CardId) -> Option<Card> {
        self.inner.lock().cards.iter().find(|c| &c.id == id).cloned()
    }

    /// Returns the cards together with the current revision.
    pub fn snapshot(&self) -> ReplicaSnapshot {
        let inner = self.inner.lock();
        ReplicaSnapshot {
            cards: inner.cards.clone(),
            revision: inner.revision,
        }
    }

    /// Returns the number of local mutations applied since load.
    pub fn revision(&self) -> u64 {
        self.inner.lock().revision
    }

    /// Returns the number of cards.
    pub fn len(&self) -> usize {
        self.inner.lock().cards.len()
    }

    /// Returns true if the workspace is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().cards.is_empty()
    }

    fn commit(&self, inner: &mut ReplicaInner, cards: Vec<Card>) -> CoreResult<()> {
        let bytes = encode_cards(&cards)?;
        inner.store.put(&self.config.workspace_key, &bytes)?;
        if self.config.sync_on_write {
            inner.store.sync()?;
        }
        inner.cards = cards;
        Ok(())
    }
}

impl std::fmt::Debug for ReplicaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ReplicaStore")
            .field("workspace_key", &self.config.workspace_key)
            .field("cards", &inner.cards.len())
            .field("revision", &inner.revision)
            .finish()
    }
}
