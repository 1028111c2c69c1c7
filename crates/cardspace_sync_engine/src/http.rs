//! HTTP gateway implementation.
//!
//! The actual HTTP client is abstracted via a trait so that any HTTP
//! library (or an in-process loopback for tests) can carry the requests.

use crate::config::{SyncConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{SyncError, SyncResult};
use crate::gateway::{RemoteFetch, RemoteGateway};
use cardspace_core::{OwnerId, WorkspaceSnapshot};
use cardspace_sync_protocol::{
    ErrorBody, FetchRequest, FetchResponse, PushRequest, PushResponse, FETCH_PATH, PUSH_PATH,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client abstraction.
///
/// Implementations own connection handling and must give up on a request
/// after `timeout`.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>, timeout: Duration) -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// Gateway to a remote store over HTTP.
///
/// Uses CBOR encoding for request/response bodies.
pub struct HttpGateway<C: HttpClient> {
    base_url: String,
    client: C,
    auth_token: Option<String>,
    request_timeout: Duration,
    open: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpGateway<C> {
    /// Creates a new HTTP gateway.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            auth_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            open: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Creates a gateway with the URL, token and timeout from `config`.
    pub fn from_config(config: &SyncConfig, client: C) -> Self {
        let mut gateway = Self::new(config.base_url.clone(), client)
            .with_request_timeout(config.request_timeout);
        gateway.auth_token.clone_from(&config.auth_token);
        gateway
    }

    /// Sends `token` with every request.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the timeout passed to the client with each request.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns true if requests can be sent.
    pub fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    /// Stops sending requests.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn post(&self, path: &str, body: Vec<u8>) -> SyncResult<Vec<u8>> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, bytes = body.len(), "posting request");
        match self.client.post(&url, body, self.request_timeout) {
            Ok(response) => {
                *self.last_error.write() = None;
                Ok(response)
            }
            Err(e) => {
                warn!(%url, error = %e, "request failed");
                *self.last_error.write() = Some(e.clone());
                Err(SyncError::transport_retryable(e))
            }
        }
    }
}

fn rejection(error: ErrorBody) -> SyncError {
    if error.is_auth_failure() {
        SyncError::AuthenticationFailed(error.message)
    } else {
        SyncError::ServerError(error.message)
    }
}

impl<C: HttpClient> RemoteGateway for HttpGateway<C> {
    fn fetch_remote(&self, owner: &OwnerId) -> SyncResult<RemoteFetch> {
        let mut request = FetchRequest::new(owner.clone());
        request.auth_token.clone_from(&self.auth_token);

        let body = self.post(FETCH_PATH, request.encode()?)?;
        let response = FetchResponse::decode(&body)?;
        if let Some(error) = response.error {
            return Err(rejection(error));
        }

        Ok(match response.document {
            Some(doc) if &doc.owner_id == owner => RemoteFetch::Found(doc),
            Some(doc) => {
                return Err(SyncError::Protocol(format!(
                    "requested document of {owner}, received {}",
                    doc.owner_id
                )))
            }
            None => RemoteFetch::NotFound,
        })
    }

    fn push_remote(&self, owner: &OwnerId, snapshot: &WorkspaceSnapshot) -> SyncResult<()> {
        let mut request =
            PushRequest::new(owner.clone(), snapshot.cards.clone(), snapshot.updated_at);
        request.auth_token.clone_from(&self.auth_token);

        let body = self.post(PUSH_PATH, request.encode()?)?;
        let response = PushResponse::decode(&body)?;
        match response.error {
            Some(error) => Err(rejection(error)),
            None if response.success => Ok(()),
            None => Err(SyncError::ServerError("push was not accepted".into())),
        }
    }
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a POST request and returns the response.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(&self, url: &str, body: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>, String> {
        let path = url.find("/workspace/").map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
