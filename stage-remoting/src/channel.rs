//! Ordered hand-off of batches between the two ends.
//!
//! Batches are delivered in the order they were sent. The channel is bounded
//! by [`RemotingConfig::channel_capacity`], so a fast producer waits for the
//! consumer instead of buffering without limit.

use tokio::sync::mpsc;

use crate::error::{RemotingError, RemotingResult};
use crate::RemotingConfig;

/// Create a bounded channel sized by `config`.
#[must_use]
pub fn channel<T>(config: &RemotingConfig) -> (BatchSender<T>, BatchReceiver<T>) {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    (BatchSender { tx }, BatchReceiver { rx })
}

/// Sending half.
#[derive(Debug)]
pub struct BatchSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for BatchSender<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> BatchSender<T> {
    /// Send a batch, waiting for room.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::ChannelClosed`] if the receiver was dropped.
    pub async fn send(&self, batch: T) -> RemotingResult<()> {
        self.tx.send(batch).await.map_err(|_| {
            tracing::warn!("Batch receiver dropped");
            RemotingError::ChannelClosed
        })
    }

    /// Send a batch without waiting.
    ///
    /// Returns `Ok(false)` if the channel is full; the batch is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RemotingError::ChannelClosed`] if the receiver was dropped.
    pub fn try_send(&self, batch: T) -> RemotingResult<bool> {
        match self.tx.try_send(batch) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Batch channel full");
                Ok(false)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RemotingError::ChannelClosed),
        }
    }

    /// Whether the receiver was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct BatchReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> BatchReceiver<T> {
    /// Wait for the next batch; `None` once every sender is dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take a queued batch without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting batches. Queued batches can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batches_arrive_in_order() {
        let (tx, mut rx) = channel::<u32>(&RemotingConfig::default());
        for n in 0..10 {
            tx.send(n).await.unwrap();
        }
        drop(tx);
        let mut received = Vec::new();
        while let Some(n) = rx.recv().await {
            received.push(n);
        }
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_send_reports_full() {
        let config = RemotingConfig {
            channel_capacity: 1,
            ..RemotingConfig::default()
        };
        let (tx, mut rx) = channel::<&str>(&config);
        assert!(tx.try_send("a").unwrap());
        assert!(!tx.try_send("b").unwrap());
        assert_eq!(rx.try_recv(), Some("a"));
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (tx, rx) = channel::<u8>(&RemotingConfig::default());
        drop(rx);
        assert!(tx.is_closed());
        assert!(matches!(tx.send(1).await, Err(RemotingError::ChannelClosed)));
        assert!(matches!(tx.try_send(1), Err(RemotingError::ChannelClosed)));
    }
}
