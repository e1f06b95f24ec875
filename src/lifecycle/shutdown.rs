//! Shutdown coordination for the agent.

use tokio::sync::watch;

/// Coordinator for process termination.
///
/// Background tasks hold a clone and call [`trigger`](Self::trigger) with
/// the exit code; the main task waits on a [`ShutdownSignal`].
#[derive(Clone)]
pub struct Shutdown {
    /// Exit code once shutdown was requested.
    tx: watch::Sender<Option<u8>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request termination with `code`. The first request wins.
    pub fn trigger(&self, code: u8) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(code);
            true
        });
    }

    /// Exit code if shutdown was already requested.
    pub fn requested(&self) -> Option<u8> {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of [`Shutdown`].
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<u8>>,
}

impl ShutdownSignal {
    /// Wait until shutdown is requested and return the exit code.
    ///
    /// Pends forever if every [`Shutdown`] handle was dropped without a request.
    pub async fn recv(&mut self) -> u8 {
        let code = match self.rx.wait_for(Option::is_some).await {
            Ok(code) => *code,
            Err(_) => None,
        };
        match code {
            Some(code) => code,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_delivers_code() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger(1);
        });
        assert_eq!(signal.recv().await, 1);
    }

    #[tokio::test]
    async fn test_first_trigger_wins() {
        let shutdown = Shutdown::new();
        shutdown.trigger(3);
        shutdown.trigger(1);
        assert_eq!(shutdown.requested(), Some(3));
        assert_eq!(shutdown.subscribe().recv().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_coordinator_never_resolves() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        drop(shutdown);
        let waited = tokio::time::timeout(Duration::from_secs(60), signal.recv()).await;
        assert!(waited.is_err());
    }
}
