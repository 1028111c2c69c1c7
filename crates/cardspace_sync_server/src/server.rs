//! Main sync server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::DocumentStore;
use cardspace_core::OwnerId;
use cardspace_storage::BlobStore;
use cardspace_sync_protocol::{
    FetchRequest, FetchResponse, PushRequest, PushResponse, RemoteDocument, SyncMessage,
    FETCH_PATH, PUSH_PATH,
};
use std::sync::Arc;
use tracing::warn;

/// The remote workspace store.
///
/// Holds one workspace document per owner and serves fetch and push
/// requests. Rejections are returned inside the response with an HTTP-style
/// status code, so a client can tell them apart from transport failures.
///
/// # Example
///
/// ```
/// use cardspace_sync_server::{ServerConfig, SyncServer};
///
/// let server = SyncServer::new(ServerConfig::default());
///
/// // In a real application, you would expose HTTP endpoints
/// // that call server.handle_post(path, body)
/// assert_eq!(server.document_count(), 0);
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a memory-only server.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(DocumentStore::new()))
    }

    /// Creates a server over an existing document store.
    pub fn with_store(config: ServerConfig, store: Arc<DocumentStore>) -> Self {
        let context = Arc::new(HandlerContext::new(config, store));
        let handler = RequestHandler::new(Arc::clone(&context));
        Self { handler, context }
    }

    /// Opens a server whose documents persist in `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if stored documents cannot be read.
    pub fn open(config: ServerConfig, backend: Box<dyn BlobStore>) -> ServerResult<Self> {
        Ok(Self::with_store(config, Arc::new(DocumentStore::open(backend)?)))
    }

    /// Handles a fetch request.
    pub fn handle_fetch(&self, request: FetchRequest) -> FetchResponse {
        self.handler.handle_fetch(request).unwrap_or_else(|e| {
            warn!(error = %e, "fetch rejected");
            FetchResponse::error(e.status_code(), e.to_string())
        })
    }

    /// Handles a push request.
    pub fn handle_push(&self, request: PushRequest) -> PushResponse {
        self.handler.handle_push(request).unwrap_or_else(|e| {
            warn!(error = %e, "push rejected");
            PushResponse::error(e.status_code(), e.to_string())
        })
    }

    /// Handles a sync message (dispatches to appropriate handler).
    pub fn handle_message(&self, message: SyncMessage) -> Result<SyncMessage, String> {
        match message {
            SyncMessage::FetchRequest(req) => Ok(SyncMessage::FetchResponse(self.handle_fetch(req))),
            SyncMessage::PushRequest(req) => Ok(SyncMessage::PushResponse(self.handle_push(req))),
            other => Err(format!("unexpected message type: {}", other.name())),
        }
    }

    /// Routes a POST body to the endpoint at `path`.
    ///
    /// Undecodable bodies get a 400 response; unknown paths are an error.
    pub fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        let encoded = match path {
            FETCH_PATH => match FetchRequest::decode(body) {
                Ok(req) => self.handle_fetch(req).encode(),
                Err(e) => FetchResponse::error(400, e.to_string()).encode(),
            },
            PUSH_PATH => match PushRequest::decode(body) {
                Ok(req) => self.handle_push(req).encode(),
                Err(e) => PushResponse::error(400, e.to_string()).encode(),
            },
            _ => return Err(format!("no route for {path}")),
        };
        encoded.map_err(|e| e.to_string())
    }

    /// Returns a copy of the owner's document.
    pub fn document(&self, owner: &OwnerId) -> Option<RemoteDocument> {
        self.context.store.get(owner)
    }

    /// Returns the number of stored documents.
    pub fn document_count(&self) -> usize {
        self.context.store.len()
    }

    /// Returns the handler context.
    pub fn context(&self) -> &Arc<HandlerContext> {
        &self.context
    }
}
