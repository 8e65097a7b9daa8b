use std::sync::Arc;
use tokio::sync::watch;

/// Signals cancellation of an analysis run across tasks
#[derive(Debug)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>,
}

/// Clonable, read-only view of a token
#[derive(Debug, Clone)]
pub struct CancellationListener {
    receiver: Arc<watch::Receiver<bool>>,
}

/// Triggers cancellation. Dropping the handle does not cancel.
#[derive(Debug)]
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    pub fn new() -> (Self, CancellationHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { receiver: rx }, CancellationHandle { sender: tx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    pub fn listener(&self) -> CancellationListener {
        CancellationListener {
            receiver: Arc::new(self.receiver.clone()),
        }
    }
}

impl CancellationListener {
    /// A listener that never fires
    pub fn never() -> Self {
        let (token, handle) = CancellationToken::new();
        drop(handle);
        token.listener()
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.as_ref().clone();
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl CancellationHandle {
    pub fn cancel(&self) {
        // No receivers left is fine
        let _ = self.sender.send(true);
    }
}
