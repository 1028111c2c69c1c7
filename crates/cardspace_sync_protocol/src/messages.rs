//! Protocol messages exchanged with the remote store.
//!
//! Each request and response encodes to a CBOR map. Failures on the remote
//! side travel inside the response (`error`) so that a rejected request is
//! distinguishable from a broken connection.

use crate::codec::{from_cbor, to_cbor};
use crate::document::RemoteDocument;
use crate::error::{ProtocolError, ProtocolResult};
use cardspace_core::{Card, OwnerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Endpoint path for [`FetchRequest`].
pub const FETCH_PATH: &str = "/workspace/fetch";
/// Endpoint path for [`PushRequest`].
pub const PUSH_PATH: &str = "/workspace/push";

/// A sync protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Fetch request.
    FetchRequest(FetchRequest),
    /// Fetch response.
    FetchResponse(FetchResponse),
    /// Push request.
    PushRequest(PushRequest),
    /// Push response.
    PushResponse(PushResponse),
}

impl SyncMessage {
    /// Returns the message name.
    pub fn name(&self) -> &'static str {
        match self {
            SyncMessage::FetchRequest(_) => "fetch_request",
            SyncMessage::FetchResponse(_) => "fetch_response",
            SyncMessage::PushRequest(_) => "push_request",
            SyncMessage::PushResponse(_) => "push_response",
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }

    /// Unwraps a fetch response.
    pub fn into_fetch_response(self) -> ProtocolResult<FetchResponse> {
        match self {
            SyncMessage::FetchResponse(r) => Ok(r),
            other => Err(ProtocolError::UnexpectedMessage {
                expected: "fetch_response",
                actual: other.name(),
            }),
        }
    }

    /// Unwraps a push response.
    pub fn into_push_response(self) -> ProtocolResult<PushResponse> {
        match self {
            SyncMessage::PushResponse(r) => Ok(r),
            other => Err(ProtocolError::UnexpectedMessage {
                expected: "push_response",
                actual: other.name(),
            }),
        }
    }
}

/// A rejection reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP-style status code.
    pub code: u16,
    /// Human-readable reason.
    pub message: String,
}

impl ErrorBody {
    /// Status code for a missing or invalid auth token.
    pub const UNAUTHORIZED: u16 = 401;

    /// Creates an error body.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the request was rejected for its credentials.
    pub fn is_auth_failure(&self) -> bool {
        self.code == Self::UNAUTHORIZED || self.code == 403
    }
}

/// Request for an owner's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Owner whose document is requested.
    pub owner_id: OwnerId,
    /// Bearer token, when the server requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl FetchRequest {
    /// Creates a fetch request.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            auth_token: None,
        }
    }

    /// Attaches an auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

/// Response to a [`FetchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// The document, or `None` if the owner has none yet.
    #[serde(default)]
    pub document: Option<RemoteDocument>,
    /// Set if the request was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl FetchResponse {
    /// Creates a response carrying a document.
    pub fn found(document: RemoteDocument) -> Self {
        Self {
            document: Some(document),
            error: None,
        }
    }

    /// Creates a response for an owner with no document.
    pub fn not_found() -> Self {
        Self {
            document: None,
            error: None,
        }
    }

    /// Creates a rejection.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            document: None,
            error: Some(ErrorBody::new(code, message)),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

/// Request to replace an owner's document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    /// Owner whose document is written.
    pub owner_id: OwnerId,
    /// The complete card set.
    pub cards: Vec<Card>,
    /// Client-side write time.
    pub updated_at: DateTime<Utc>,
    /// Bearer token, when the server requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl PushRequest {
    /// Creates a push request.
    pub fn new(owner_id: OwnerId, cards: Vec<Card>, updated_at: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            cards,
            updated_at,
            auth_token: None,
        }
    }

    /// Attaches an auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

/// Response to a [`PushRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResponse {
    /// Whether the document was written.
    pub success: bool,
    /// Stored update time on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set if the request was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl PushResponse {
    /// Creates a successful response.
    pub fn success(updated_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            updated_at: Some(updated_at),
            error: None,
        }
    }

    /// Creates a rejection.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            updated_at: None,
            error: Some(ErrorBody::new(code, message)),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        to_cbor(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        from_cbor(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::{CardBody, CardVariant, KanbanColumn, Position};

    fn kanban_card() -> Card {
        let mut card = Card::new("k".into(), CardVariant::Kanban, Position::new(-3.0, 8.5));
        card.body = CardBody::Kanban {
            columns: vec![KanbanColumn::new("Backlog")],
        };
        card
    }

    #[test]
    fn push_request_carries_tagged_bodies() {
        let request = PushRequest::new(
            "owner".into(),
            vec![kanban_card(), Card::new("t".into(), CardVariant::Text, Position::default())],
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .with_auth_token("tok");

        let decoded = PushRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.cards[0].variant(), CardVariant::Kanban);
    }

    #[test]
    fn fetch_response_states() {
        let doc = RemoteDocument::new("o".into(), vec![kanban_card()], Utc::now());
        let found = FetchResponse::decode(&FetchResponse::found(doc.clone()).encode().unwrap()).unwrap();
        assert_eq!(found.document, Some(doc));
        assert!(found.error.is_none());

        let missing = FetchResponse::decode(&FetchResponse::not_found().encode().unwrap()).unwrap();
        assert!(missing.document.is_none());
        assert!(missing.error.is_none());

        let rejected =
            FetchResponse::decode(&FetchResponse::error(401, "nope").encode().unwrap()).unwrap();
        let error = rejected.error.unwrap();
        assert_eq!(error.message, "nope");
        assert!(error.is_auth_failure());
    }

    #[test]
    fn message_envelope() {
        let message = SyncMessage::FetchRequest(FetchRequest::new("o".into()));
        let decoded = SyncMessage::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded.name(), "fetch_request");

        let err = decoded.into_push_response().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedMessage {
                expected: "push_response",
                actual: "fetch_request"
            }
        ));
    }

    #[test]
    fn push_response_requires_success_flag() {
        let fetch = FetchRequest::new("o".into());
        assert!(matches!(
            PushResponse::decode(&fetch.encode().unwrap()),
            Err(ProtocolError::Decode(_))
        ));
    }
}
