use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-call state threaded explicitly through every resolver and transport call.
///
/// `chain` lists the transports the current call is already nested in, outermost
/// first. A transport that resolves its own server address through the resolver
/// hands its context back in, so the resolver can refuse to recurse into the
/// same transport.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    chain: Vec<Arc<str>>,
    cancel: CancellationToken,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            chain: Vec::new(),
            cancel,
        }
    }

    /// Returns a context nested one level deeper, inside `transport`.
    pub fn with_transport(&self, transport: &str) -> Self {
        let mut chain = self.chain.clone();
        chain.push(Arc::from(transport));
        Self {
            chain,
            cancel: self.cancel.clone(),
        }
    }

    pub fn contains_transport(&self, transport: &str) -> bool {
        self.chain.iter().any(|name| name.as_ref() == transport)
    }

    pub fn transports(&self) -> &[Arc<str>] {
        &self.chain
    }

    /// Same call chain with a child cancellation token: cancelling the parent
    /// cancels the child, cancelling the child leaves the parent alone.
    pub fn child(&self) -> Self {
        Self {
            chain: self.chain.clone(),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
