//! Pending handshake handle.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use tokio::sync::oneshot::{self, error::TryRecvError};
use treesync_core::Session;

use crate::error::ConnectError;

pub(crate) type ConnectResult = Result<Session, ConnectError>;

/// Resolves once, when the handshake started by `Client::connect` ends.
///
/// Await it, poll it with [`try_result`](Self::try_result) from a
/// synchronous loop, or bound the wait with
/// [`wait_timeout`](Self::wait_timeout).
#[derive(Debug)]
#[must_use = "a Connecting handle reports how the handshake ended"]
pub struct Connecting {
    rx: oneshot::Receiver<ConnectResult>,
}

impl Connecting {
    pub(crate) fn channel() -> (oneshot::Sender<ConnectResult>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Outcome if the handshake has ended, `None` while it is in progress.
    pub fn try_result(&mut self) -> Option<ConnectResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ConnectError::Dropped)),
        }
    }

    /// Wait at most `limit` for the outcome.
    ///
    /// Requires a tokio runtime with the time driver enabled.
    pub async fn wait_timeout(self, limit: Duration) -> ConnectResult {
        tokio::time::timeout(limit, self)
            .await
            .unwrap_or(Err(ConnectError::HandshakeTimeout { elapsed: limit }))
    }
}

impl Future for Connecting {
    type Output = ConnectResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|r| r.unwrap_or(Err(ConnectError::Dropped)))
    }
}
