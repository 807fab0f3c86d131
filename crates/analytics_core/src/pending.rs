//! Completion handles for timeline operations.

use crate::error::PluginError;
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sending half of a [`Pending`] handle.
pub(crate) type Completion<T> = oneshot::Sender<Result<T, PluginError>>;

/// Handle to a timeline operation that was submitted but may not have run yet.
///
/// The operation is recorded when the handle is created, so submissions keep
/// their order whether or not the handle is awaited. Dropping the handle does
/// not cancel the operation.
#[must_use = "the outcome of a timeline operation is only observable by awaiting it"]
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, PluginError>>,
}

impl<T> Pending<T> {
    pub(crate) fn channel() -> (Completion<T>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A handle that is already settled.
    pub(crate) fn settled(outcome: Result<T, PluginError>) -> Self {
        let (tx, pending) = Self::channel();
        // The receiver is alive in `pending`, so this cannot fail.
        let _ = tx.send(outcome);
        pending
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, PluginError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PluginError::Dropped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_settled_handle_resolves() {
        let pending = Pending::settled(Ok(7));
        assert_eq!(pending.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_dropped_completion_reports_dropped() {
        let (tx, pending) = Pending::<()>::channel();
        drop(tx);
        assert!(matches!(pending.await, Err(PluginError::Dropped)));
    }

    #[tokio::test]
    async fn test_pending_until_completed() {
        let (tx, mut pending) = Pending::<u8>::channel();
        assert!(futures::poll!(&mut pending).is_pending());

        tx.send(Ok(1)).unwrap();
        assert_eq!(pending.await.unwrap(), 1);
    }
}
