//! The remote per-owner document.

use cardspace_core::{Card, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One workspace document as held by the remote store.
///
/// There is exactly one document per owner. Writes are upserts: the first
/// push creates the document and later pushes replace `cards_data` and
/// `updated_at` while keeping `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// Owner of the workspace.
    pub owner_id: OwnerId,
    /// Cards in display order.
    pub cards_data: Vec<Card>,
    /// When the document was first written.
    pub created_at: DateTime<Utc>,
    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl RemoteDocument {
    /// Creates a document whose creation and update times are equal.
    pub fn new(owner_id: OwnerId, cards_data: Vec<Card>, at: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            cards_data,
            created_at: at,
            updated_at: at,
        }
    }

}
