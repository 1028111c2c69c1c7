//! Request handlers for the workspace endpoints.

use crate::auth::{AuthConfig, TokenValidator};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::store::DocumentStore;
use cardspace_core::OwnerId;
use cardspace_sync_protocol::{FetchRequest, FetchResponse, PushRequest, PushResponse};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Document store (shared across all handlers).
    pub store: Arc<DocumentStore>,
    validator: Option<TokenValidator>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, store: Arc<DocumentStore>) -> Self {
        let validator = match (&config.auth_secret, config.require_auth) {
            (Some(secret), true) => Some(TokenValidator::new(
                AuthConfig::new(secret.clone()).with_expiry(config.token_expiry),
            )),
            _ => None,
        };
        Self {
            config,
            store,
            validator,
        }
    }

    /// Returns the token validator when auth is enabled.
    pub fn validator(&self) -> Option<&TokenValidator> {
        self.validator.as_ref()
    }

    fn authorize(&self, owner: &OwnerId, token: Option<&str>) -> ServerResult<()> {
        if !self.config.require_auth {
            return Ok(());
        }
        let validator = self
            .validator
            .as_ref()
            .ok_or_else(|| ServerError::Internal("auth required but no secret set".into()))?;
        let token =
            token.ok_or_else(|| ServerError::AuthenticationFailed("missing token".into()))?;
        validator.validate_token(token, owner)
    }
}

/// Handler for workspace requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles a fetch request.
    pub fn handle_fetch(&self, request: FetchRequest) -> ServerResult<FetchResponse> {
        self.context
            .authorize(&request.owner_id, request.auth_token.as_deref())?;

        Ok(match self.context.store.get(&request.owner_id) {
            Some(doc) => {
                debug!(owner = %request.owner_id, cards = doc.cards_data.len(), "fetch");
                FetchResponse::found(doc)
            }
            None => {
                debug!(owner = %request.owner_id, "fetch: no document");
                FetchResponse::not_found()
            }
        })
    }

    /// Handles a push request.
    pub fn handle_push(&self, request: PushRequest) -> ServerResult<PushResponse> {
        self.context
            .authorize(&request.owner_id, request.auth_token.as_deref())?;

        let limit = self.context.config.max_cards;
        if request.cards.len() > limit {
            return Err(ServerError::TooLarge {
                cards: request.cards.len(),
                limit,
            });
        }

        {
            let mut seen = HashSet::with_capacity(request.cards.len());
            for card in &request.cards {
                if !seen.insert(&card.id) {
                    return Err(ServerError::InvalidRequest(format!(
                        "duplicate card id {}",
                        card.id
                    )));
                }
                if !card.is_finite() {
                    return Err(ServerError::InvalidRequest(format!(
                        "card {} has non-finite geometry",
                        card.id
                    )));
                }
            }
        }

        let doc = self
            .context
            .store
            .upsert(&request.owner_id, request.cards, request.updated_at)?;
        debug!(owner = %doc.owner_id, cards = doc.cards_data.len(), "push stored");
        Ok(PushResponse::success(doc.updated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardspace_core::{Card, CardVariant, Position};
    use chrono::Utc;

    fn handler(config: ServerConfig) -> RequestHandler {
        let context = Arc::new(HandlerContext::new(config, Arc::new(DocumentStore::new())));
        RequestHandler::new(context)
    }

    fn card(id: &str) -> Card {
        Card::new(id.into(), CardVariant::Text, Position::default())
    }

    #[test]
    fn fetch_then_push_then_fetch() {
        let handler = handler(ServerConfig::default());
        let owner = OwnerId::from("o");

        let response = handler.handle_fetch(FetchRequest::new(owner.clone())).unwrap();
        assert!(response.document.is_none());

        let now = Utc::now();
        let response = handler
            .handle_push(PushRequest::new(owner.clone(), vec![card("a")], now))
            .unwrap();
        assert!(response.success);
        assert_eq!(response.updated_at, Some(now));

        let doc = handler
            .handle_fetch(FetchRequest::new(owner))
            .unwrap()
            .document
            .unwrap();
        assert_eq!(doc.cards_data, vec![card("a")]);
    }

    #[test]
    fn push_limits() {
        let handler = handler(ServerConfig::default().with_max_cards(1));
        let owner = OwnerId::from("o");

        let err = handler
            .handle_push(PushRequest::new(owner.clone(), vec![card("a"), card("b")], Utc::now()))
            .unwrap_err();
        assert!(matches!(err, ServerError::TooLarge { cards: 2, limit: 1 }));

        let handler = self::handler(ServerConfig::default());
        let err = handler
            .handle_push(PushRequest::new(owner, vec![card("a"), card("a")], Utc::now()))
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidRequest(_)));
    }

    #[test]
    fn push_with_non_finite_card_is_rejected() {
        let handler = handler(ServerConfig::default());
        let owner = OwnerId::from("o");
        handler
            .handle_push(PushRequest::new(owner.clone(), vec![card("a")], Utc::now()))
            .unwrap();

        let mut broken = card("b");
        broken.position.x = f64::NAN;
        let err = handler
            .handle_push(PushRequest::new(owner.clone(), vec![card("a"), broken], Utc::now()))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let doc = handler.context.store.get(&owner).unwrap();
        assert_eq!(doc.cards_data, vec![card("a")]);
    }

    #[test]
    fn auth_required() {
        let handler = handler(ServerConfig::default().with_auth(b"secret".to_vec()));
        let owner = OwnerId::from("alice");

        let err = handler
            .handle_fetch(FetchRequest::new(owner.clone()))
            .unwrap_err();
        assert_eq!(err.status_code(), 401);

        let token = handler
            .context
            .validator()
            .unwrap()
            .create_token(&owner)
            .unwrap();
        let ok = handler.handle_fetch(FetchRequest::new(owner).with_auth_token(token.clone()));
        assert!(ok.is_ok());

        let err = handler
            .handle_fetch(FetchRequest::new("mallory".into()).with_auth_token(token))
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }
}
