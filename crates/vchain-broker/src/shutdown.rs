use std::sync::Arc;

use tokio::sync::watch;

/// Process-wide shutdown trigger. Cloning shares the same trigger.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`Shutdown`].
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn triggered(&mut self) {
        wait_until_set(&mut self.rx).await;
    }
}

/// Wait for a flag to become `true`. A dropped sender never sets it.
pub(crate) async fn wait_until_set(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|set| *set).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
