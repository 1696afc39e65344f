//! Simulated host runtime for the host-channel transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;
use treesync_client::transports::HostRuntime;

#[derive(Debug, Default)]
struct Registry {
    registered: Vec<String>,
    registrations: usize,
}

/// Host runtime that forwards posted payloads to an authority inbox.
///
/// Posting on a channel that was never registered fails, the way a real
/// host rejects it.
#[derive(Debug, Clone)]
pub struct SimHost {
    outbox: mpsc::UnboundedSender<Bytes>,
    registry: Arc<Mutex<Registry>>,
}

impl SimHost {
    /// Host plus the receiving end to hand to a [`crate::SimAuthority`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        (Self { outbox, registry: Arc::default() }, inbox)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `channel` is currently registered.
    pub fn is_registered(&self, channel: &str) -> bool {
        self.registry().registered.iter().any(|c| c == channel)
    }

    /// Total successful registrations.
    pub fn registrations(&self) -> usize {
        self.registry().registrations
    }
}

impl HostRuntime for SimHost {
    fn register(&mut self, channel: &str) -> Result<(), String> {
        let mut registry = self.registry();
        if registry.registered.iter().any(|c| c == channel) {
            return Err(format!("channel {channel} already registered"));
        }
        registry.registered.push(channel.to_string());
        registry.registrations += 1;
        Ok(())
    }

    fn post(&mut self, channel: &str, payload: Bytes) -> Result<(), String> {
        if !self.is_registered(channel) {
            return Err(format!("channel {channel} not registered"));
        }
        self.outbox.send(payload).map_err(|_| "host shut down".to_string())
    }

    fn unregister(&mut self, channel: &str) {
        self.registry().registered.retain(|c| c != channel);
    }
}
