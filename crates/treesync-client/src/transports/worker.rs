//! In-process worker transport.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use treesync_core::{RoutingMode, Transport};
use treesync_proto::{ClientMessage, ServerMessage, WireMessage};

use super::TransportError;

/// Receives each encoded client message on the worker side.
pub type RemoteHandler = Box<dyn FnMut(Bytes) + Send>;

#[derive(Default)]
struct Port {
    queue: VecDeque<Bytes>,
    handler: Option<RemoteHandler>,
    open: bool,
}

fn lock(port: &Mutex<Port>) -> MutexGuard<'_, Port> {
    port.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Client side of a worker channel.
///
/// Messages sent before the worker registers its handler are queued, not
/// dropped, and delivered in order on [`WorkerPort::attach`]. Headless, so
/// it defaults to hidden routing.
pub struct WorkerTransport {
    port: Arc<Mutex<Port>>,
}

/// Worker side of the channel.
///
/// Handlers run under the port lock and must not call back into the port.
#[derive(Clone)]
pub struct WorkerPort {
    port: Arc<Mutex<Port>>,
}

impl WorkerTransport {
    /// Create a connected transport and port pair.
    pub fn pair() -> (Self, WorkerPort) {
        let port = Arc::new(Mutex::new(Port::default()));
        (Self { port: Arc::clone(&port) }, WorkerPort { port })
    }
}

impl WorkerPort {
    /// Register the worker's handler and deliver everything queued so far.
    pub fn attach(&self, handler: impl FnMut(Bytes) + Send + 'static) {
        let mut port = lock(&self.port);
        let mut handler: RemoteHandler = Box::new(handler);

        let backlog = port.queue.len();
        while let Some(message) = port.queue.pop_front() {
            handler(message);
        }
        if backlog > 0 {
            tracing::debug!(backlog, "worker attached, backlog delivered");
        }
        port.handler = Some(handler);
    }

    /// Unregister the handler. Later messages queue again.
    pub fn detach(&self) {
        lock(&self.port).handler = None;
    }

    /// Messages waiting for a handler.
    pub fn pending(&self) -> usize {
        lock(&self.port).queue.len()
    }
}

impl Transport for WorkerTransport {
    type Payload = Bytes;
    type Error = TransportError;

    fn open(&mut self) -> Result<(), TransportError> {
        lock(&self.port).open = true;
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let mut port = lock(&self.port);
        if !port.open {
            return Err(TransportError::NotOpen);
        }

        let encoded = message.encode()?;
        match port.handler.as_mut() {
            Some(handler) => handler(encoded),
            None => port.queue.push_back(encoded),
        }
        Ok(())
    }

    fn decode(&self, payload: Bytes) -> Result<ServerMessage, TransportError> {
        Ok(ServerMessage::decode(&payload)?)
    }

    fn close(&mut self) {
        let mut port = lock(&self.port);
        port.open = false;
        port.queue.clear();
    }

    fn default_routing(&self) -> RoutingMode {
        RoutingMode::Hidden
    }
}

impl fmt::Debug for WorkerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let port = lock(&self.port);
        f.debug_struct("WorkerTransport")
            .field("open", &port.open)
            .field("queued", &port.queue.len())
            .field("attached", &port.handler.is_some())
            .finish()
    }
}
