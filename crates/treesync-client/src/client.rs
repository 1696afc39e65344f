//! Transport-agnostic client.
//!
//! [`Client`] composes the tree store, the session state machine and the
//! routing manager behind one object, and moves messages through whichever
//! [`Transport`] it was built with. Adding a transport never touches this
//! file.
//!
//! # Message flow
//!
//! ```text
//!  transport ──payload──> receive ──ServerMessage──> handle_message
//!                                                       │
//!              ┌────────────┬───────────────┬───────────┼─────────────┐
//!              ▼            ▼               ▼           ▼             ▼
//!          Connection   TreeStore      ViewState     Router     ClientAction
//!
//!  send_event / back / forward / platform signal ──> dispatch ──> transport
//!                                         (queued until handshake)
//! ```
//!
//! Like the core state machines the client never reads a clock: time is
//! passed to [`Client::connect`], [`Client::receive`] and [`Client::tick`].

use std::{collections::VecDeque, fmt, time::Instant};

use tokio::sync::oneshot;
use treesync_core::{
    CloseReason, Connection, ConnectionAction, ConnectionError, ConnectionState, HistoryPlatform,
    PlatformSignal, Router, RoutingMode, Session, StoreHandle, Transport, routing,
};
use treesync_proto::{
    Binding, CallbackRef, Capabilities, ClientMessage, ErrorContext, EventMessage, Hello,
    HelloResponse, PROTOCOL_VERSION, Patch, RemoteError, SerializedElement, ServerMessage, Value,
};

use crate::{
    config::{ClientConfig, EventPolicy},
    connecting::{ConnectResult, Connecting},
    error::{ClientError, ConnectError},
    view::{ClientAction, ViewState},
};

/// A client bound to one transport.
pub struct Client<T: Transport> {
    transport: T,
    connection: Connection,
    store: StoreHandle,
    router: Box<dyn Router>,
    config: ClientConfig,
    view: ViewState,
    /// Outbound messages waiting for the handshake
    queued: VecDeque<ClientMessage>,
    /// Resolves the `Connecting` handle of the current attempt
    pending_connect: Option<oneshot::Sender<ConnectResult>>,
}

impl<T: Transport> Client<T> {
    /// Build a client.
    ///
    /// The routing mode is `config.routing` if set, else the transport's
    /// default. `platform` is required for history and fragment routing and
    /// ignored for hidden routing.
    ///
    /// # Errors
    ///
    /// Returns `Routing` if the selected mode needs a platform and none was
    /// supplied
    pub fn new(
        transport: T,
        store: StoreHandle,
        platform: Option<Box<dyn HistoryPlatform>>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let mode = config.routing.unwrap_or_else(|| transport.default_routing());
        let router = routing::build(mode, platform, config.initial_path.clone())?;

        tracing::debug!(client_id = %config.client_id, ?mode, "client created");
        Ok(Self {
            transport,
            connection: Connection::new(config.connection.clone()),
            store,
            router,
            config,
            view: ViewState::Disconnected { reason: None },
            queued: VecDeque::new(),
            pending_connect: None,
        })
    }

    /// Open the transport and send `Hello`.
    ///
    /// The view moves to `Connecting`. The returned handle resolves exactly
    /// once: with the session on `HelloResponse`, or with the reason the
    /// attempt ended.
    ///
    /// # Errors
    ///
    /// - `Connection` if a session is already connecting or connected
    /// - `Transport` if the channel cannot be opened or `Hello` cannot be
    ///   sent; the client stays disconnected and the view is unchanged
    pub fn connect(&mut self, now: Instant) -> Result<Connecting, ClientError> {
        let state = self.connection.state();
        if state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState { state, operation: "connect" }.into());
        }

        self.transport.open().map_err(ClientError::transport)?;

        let hello = self.hello();
        for action in self.connection.connect(hello, now)? {
            let ConnectionAction::SendMessage(message) = action else { continue };
            if let Err(error) = self.transport.send(&message) {
                tracing::warn!(%error, "hello could not be sent");
                self.connection.close(&CloseReason::Transport(error.to_string()));
                self.transport.close();
                return Err(ClientError::transport(error));
            }
        }

        let (tx, connecting) = Connecting::channel();
        self.pending_connect = Some(tx);
        self.view = ViewState::Connecting;
        Ok(connecting)
    }

    fn hello(&self) -> Hello {
        let hidden = self.router.mode() == RoutingMode::Hidden;
        let mut capabilities = self.config.capabilities;
        capabilities.set(Capabilities::HIDDEN_ROUTING, hidden);

        Hello {
            client_id: self.config.client_id.clone(),
            protocol_version: PROTOCOL_VERSION,
            color_scheme: self.config.effective_color_scheme(),
            locale: self.config.locale.clone(),
            capabilities,
            initial_path: hidden.then(|| self.router.current_path()),
        }
    }

    /// Decode and process one inbound payload.
    ///
    /// Timeouts are checked first, so a `HelloResponse` that arrives after
    /// the handshake deadline is not honored. An undecodable payload is a
    /// transport failure and disconnects the client.
    pub fn receive(&mut self, payload: T::Payload, now: Instant) -> Vec<ClientAction> {
        let mut actions = self.tick(now);

        match self.transport.decode(payload) {
            Ok(message) => actions.extend(self.handle_message(message)),
            Err(error) => {
                tracing::warn!(%error, "undecodable message");
                actions.extend(self.shutdown(&CloseReason::Decode(error.to_string())));
            },
        }
        actions
    }

    /// Process one decoded message.
    ///
    /// Until the handshake completes only `HelloResponse` is honored;
    /// anything else is dropped. A reply that cannot be sent disconnects the
    /// client and the returned actions report it.
    pub fn handle_message(&mut self, message: ServerMessage) -> Vec<ClientAction> {
        if self.connection.session().is_some_and(|s| s.traces(message.category())) {
            tracing::trace!(kind = message.kind(), ?message, "inbound");
        }

        match message {
            ServerMessage::HelloResponse(response) => self.on_hello_response(&response),
            ServerMessage::Unknown => {
                tracing::debug!("ignoring message of unknown kind");
                Vec::new()
            },
            other if !self.connection.is_connected() => {
                tracing::warn!(
                    kind = other.kind(),
                    state = ?self.connection.state(),
                    "message before handshake dropped"
                );
                Vec::new()
            },
            ServerMessage::Render { root } => self.on_render(&root),
            ServerMessage::PatchBatch { patches } => self.on_patches(&patches),
            ServerMessage::Error(error) => self.on_remote_error(error),
            ServerMessage::PushPath { path } => {
                self.router.push_state(&path);
                Vec::new()
            },
            ServerMessage::GoBack => {
                let changed = self.router.back();
                self.dispatch_navigation(changed)
            },
            ServerMessage::GoForward => {
                let changed = self.router.forward();
                self.dispatch_navigation(changed)
            },
            ServerMessage::Reload => vec![ClientAction::Reload],
        }
    }

    /// Record the session, flush queued messages in order, then go `Ready`.
    ///
    /// A flush that fails leaves the unsent messages queued and resolves the
    /// pending connect with the transport error instead.
    fn on_hello_response(&mut self, response: &HelloResponse) -> Vec<ClientAction> {
        let session = match self.connection.receive_hello_response(response) {
            Ok(session) => session.clone(),
            Err(error) => {
                tracing::warn!(%error, "unexpected HelloResponse ignored");
                return Vec::new();
            },
        };

        let mut actions = Vec::new();
        while let Some(message) = self.queued.pop_front() {
            if !self.transmit(&message, &mut actions) {
                self.queued.push_front(message);
                break;
            }
        }

        if self.connection.is_connected() {
            actions.extend(self.set_view(ViewState::Ready));
            if let Some(tx) = self.pending_connect.take() {
                // Receiver may have been dropped; the session stands regardless.
                let _ = tx.send(Ok(session));
            }
        }
        actions
    }

    fn on_render(&mut self, root: &SerializedElement) -> Vec<ClientAction> {
        let diagnostics = self.store.set_tree(root);

        let mut actions = self.set_view(ViewState::Ready);
        if !diagnostics.is_empty() {
            actions.push(ClientAction::Diagnostics(diagnostics));
        }
        actions
    }

    fn on_patches(&mut self, patches: &[Patch]) -> Vec<ClientAction> {
        if matches!(self.view, ViewState::RenderError { .. }) {
            tracing::debug!(count = patches.len(), "patch batch held back by render error");
            return Vec::new();
        }

        let diagnostics = self.store.apply_patches(patches);
        if diagnostics.is_empty() { Vec::new() } else { vec![ClientAction::Diagnostics(diagnostics)] }
    }

    fn on_remote_error(&mut self, error: RemoteError) -> Vec<ClientAction> {
        let RemoteError { message, context } = error;
        tracing::warn!(?context, %message, "authority reported error");

        match context {
            ErrorContext::Render => self.set_view(ViewState::RenderError { message }),
            ErrorContext::Callback => vec![ClientAction::CallbackError { message }],
        }
    }

    /// Check the handshake timeout.
    ///
    /// Call periodically while connecting. On timeout the transport is closed,
    /// the view moves to `Disconnected` and the pending connect resolves with
    /// `HandshakeTimeout`.
    pub fn tick(&mut self, now: Instant) -> Vec<ClientAction> {
        let actions = self.connection.tick(now);
        self.execute(actions)
    }

    /// Report that the transport closed or failed underneath the client.
    ///
    /// Idempotent: only the first report after a connect produces actions.
    pub fn transport_closed(&mut self, reason: impl Into<String>) -> Vec<ClientAction> {
        let reason = reason.into();
        tracing::warn!(%reason, "transport closed");
        self.shutdown(&CloseReason::Transport(reason))
    }

    /// End the session and release platform listeners. Idempotent.
    ///
    /// Queued events are discarded. A later [`connect`](Self::connect) works
    /// but out-of-band location changes are no longer observed.
    pub fn disconnect(&mut self) -> Vec<ClientAction> {
        self.router.destroy();
        self.queued.clear();
        self.shutdown(&CloseReason::Local)
    }

    /// Send a callback invocation.
    ///
    /// Before the handshake the event is queued or dropped according to
    /// [`EventPolicy`]. If the send fails the client disconnects, the event
    /// falls under the same policy, and the returned actions carry the
    /// `Disconnected` view change.
    pub fn send_event(&mut self, callback_id: impl Into<String>, args: Vec<Value>) -> Vec<ClientAction> {
        let event = EventMessage { callback_id: callback_id.into(), args };
        if self.connection.session().is_some_and(|s| s.traces("events")) {
            tracing::trace!(callback_id = %event.callback_id, args = event.args.len(), "event");
        }
        self.dispatch(ClientMessage::Event(event))
    }

    /// Invoke a callback-reference prop. See [`send_event`](Self::send_event).
    pub fn invoke(&mut self, callback: &CallbackRef, args: Vec<Value>) -> Vec<ClientAction> {
        self.send_event(callback.id.clone(), args)
    }

    /// Push a new value for a two-way binding to the authority.
    pub fn set_binding(&mut self, binding: &Binding, value: impl Into<Value>) -> Vec<ClientAction> {
        self.send_event(binding.reference.clone(), vec![value.into()])
    }

    /// Navigate to `path` locally.
    pub fn push_state(&mut self, path: &str) {
        self.router.push_state(path);
    }

    /// Step back. Hidden routing reports the new path immediately; platform
    /// routing reports it when the platform signals.
    pub fn back(&mut self) -> Vec<ClientAction> {
        let changed = self.router.back();
        self.dispatch_navigation(changed)
    }

    /// Step forward.
    pub fn forward(&mut self) -> Vec<ClientAction> {
        let changed = self.router.forward();
        self.dispatch_navigation(changed)
    }

    /// Current path.
    pub fn current_path(&self) -> String {
        self.router.current_path()
    }

    /// Deliver a platform location signal (back button, fragment edit).
    pub fn on_platform_signal(&mut self, signal: PlatformSignal) -> Vec<ClientAction> {
        let changed = self.router.on_platform_signal(signal);
        self.dispatch_navigation(changed)
    }

    fn dispatch_navigation(&mut self, message: Option<ClientMessage>) -> Vec<ClientAction> {
        match message {
            Some(message) => self.dispatch(message),
            None => Vec::new(),
        }
    }

    /// Send now if connected, else apply the event policy.
    ///
    /// A failed send disconnects first, so the message then falls under the
    /// policy like any other message sent while disconnected.
    fn dispatch(&mut self, message: ClientMessage) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        if self.connection.is_connected() && self.transmit(&message, &mut actions) {
            return actions;
        }

        match self.config.event_policy {
            EventPolicy::Queue => {
                tracing::debug!(kind = message.kind(), queued = self.queued.len() + 1, "queued");
                self.queued.push_back(message);
            },
            EventPolicy::Drop => {
                tracing::debug!(kind = message.kind(), "dropped while disconnected");
            },
        }
        actions
    }

    /// Send one message. On failure the client shuts down, the resulting
    /// actions are appended to `actions` and `false` is returned.
    fn transmit(&mut self, message: &ClientMessage, actions: &mut Vec<ClientAction>) -> bool {
        match self.transport.send(message) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(kind = message.kind(), %error, "send failed");
                actions.extend(self.shutdown(&CloseReason::Transport(error.to_string())));
                false
            },
        }
    }

    fn execute(&mut self, actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                ConnectionAction::SendMessage(message) => {
                    if !self.transmit(&message, &mut out) {
                        break;
                    }
                },
                ConnectionAction::Close { reason } => {
                    tracing::warn!(%reason, "connection closed by state machine");
                    out.extend(self.finish(&reason));
                },
            }
        }
        out
    }

    /// Close the state machine, then run the side effects if it moved.
    fn shutdown(&mut self, reason: &CloseReason) -> Vec<ClientAction> {
        if self.connection.close(reason) { self.finish(reason) } else { Vec::new() }
    }

    /// Side effects of a close the state machine has already performed.
    fn finish(&mut self, reason: &CloseReason) -> Vec<ClientAction> {
        self.transport.close();

        if let Some(tx) = self.pending_connect.take() {
            let error = match reason {
                CloseReason::HandshakeTimeout { elapsed } => {
                    ConnectError::HandshakeTimeout { elapsed: *elapsed }
                },
                CloseReason::Local => ConnectError::Disconnected,
                CloseReason::Transport(_) | CloseReason::Decode(_) => {
                    ConnectError::Transport(reason.to_string())
                },
            };
            let _ = tx.send(Err(error));
        }

        self.set_view(ViewState::Disconnected { reason: Some(reason.to_string()) })
    }

    fn set_view(&mut self, view: ViewState) -> Vec<ClientAction> {
        if self.view == view {
            return Vec::new();
        }

        tracing::debug!(from = ?self.view, to = ?view, "view changed");
        self.view = view.clone();
        vec![ClientAction::ViewChanged(view)]
    }

    /// Session state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Session recorded at the last handshake.
    pub fn session(&self) -> Option<&Session> {
        self.connection.session()
    }

    /// Session id assigned by the authority.
    pub fn session_id(&self) -> Option<&str> {
        self.session().map(|s| s.session_id.as_str())
    }

    /// Authority version reported at handshake.
    pub fn server_version(&self) -> Option<&str> {
        self.session().map(|s| s.server_version.as_str())
    }

    /// Presentation state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Tree store this client writes to.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Routing discipline in use.
    pub fn mode(&self) -> RoutingMode {
        self.router.mode()
    }

    /// Messages waiting for the handshake.
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.connection.state())
            .field("view", &self.view)
            .field("mode", &self.router.mode())
            .field("queued", &self.queued.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
