//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::time::Instant;

use treesync_client::{
    Client, ClientConfig,
    transports::{Hosting, SocketTransport},
};
use treesync_core::StoreHandle;
use treesync_proto::{Patch, SerializedElement, ServerMessage};

use crate::{
    authority::SimAuthority,
    scenario::{OracleFn, World},
};

/// Scenario builder.
///
/// Add clients and the authority's script, then call `.oracle()` to get a
/// [`RunnableScenario`].
pub struct Scenario {
    name: String,
    clients: Vec<(String, ClientConfig)>,
    server_version: String,
    script: Vec<ServerMessage>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clients: Vec::new(),
            server_version: "2.0".to_string(),
            script: Vec::new(),
        }
    }

    /// Add a client with default configuration.
    pub fn client(mut self, name: impl Into<String>) -> Self {
        self.clients.push((name.into(), ClientConfig::default()));
        self
    }

    /// Add a client with custom configuration.
    pub fn client_with_config(mut self, name: impl Into<String>, config: ClientConfig) -> Self {
        self.clients.push((name.into(), config));
        self
    }

    /// Version every authority reports.
    pub fn server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = version.into();
        self
    }

    /// Script a full render.
    pub fn render(self, root: SerializedElement) -> Self {
        self.send(ServerMessage::Render { root })
    }

    /// Script a patch batch.
    pub fn patches(self, patches: Vec<Patch>) -> Self {
        self.send(ServerMessage::PatchBatch { patches })
    }

    /// Script any server message.
    pub fn send(mut self, message: ServerMessage) -> Self {
        self.script.push(message);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Every client gets its own store, a headless socket transport and an
    /// authority assigning session ids `s1`, `s2`, ... in declaration order.
    /// For each client:
    /// 1. Client sends `Hello`
    /// 2. Authority answers `HelloResponse`
    /// 3. The client's connect handle must resolve with the session
    /// 4. The script is played to the client in order
    ///
    /// Then the oracle checks the world.
    pub fn run(self) -> Result<(), String> {
        let Self { scenario, oracle } = self;
        let name = scenario.name;
        let now = Instant::now();
        let mut world = World::new();

        for (index, (client_name, config)) in scenario.clients.into_iter().enumerate() {
            let (transport, frames) = SocketTransport::channel(Hosting::Headless);
            let client = Client::new(transport, StoreHandle::new(), None, config)
                .map_err(|e| format!("Scenario '{name}': client {client_name} not built: {e}"))?;
            let authority = SimAuthority::new(frames, format!("s{}", index + 1))
                .with_server_version(scenario.server_version.clone());
            world.add_client(client_name, client, authority);
        }

        for client_name in world.client_names() {
            let actor = world
                .actor_mut(&client_name)
                .ok_or_else(|| format!("Scenario '{name}': client {client_name} not found"))?;
            let fail = |what: String| format!("Scenario '{name}': client {client_name} {what}");

            let mut connecting =
                actor.client.connect(now).map_err(|e| fail(format!("connect failed: {e}")))?;

            let hello = actor.authority.poll();
            actor.frames_sent += hello.len();
            if hello.len() != 1 {
                return Err(fail(format!("sent {} frames instead of one Hello", hello.len())));
            }

            let reply = actor
                .authority
                .hello_response_frame()
                .map_err(|e| fail(format!("HelloResponse not encodable: {e}")))?;
            actor.frames_received += 1;
            let actions = actor.client.receive(reply, now);
            actor.actions.extend(actions);

            match connecting.try_result() {
                Some(Ok(_)) => {},
                other => return Err(fail(format!("connect did not resolve: {other:?}"))),
            }

            for message in &scenario.script {
                let frame = SimAuthority::frame(message)
                    .map_err(|e| fail(format!("{} not encodable: {e}", message.kind())))?;
                actor.frames_received += 1;
                let actions = actor.client.receive(frame, now);
                actor.actions.extend(actions);
            }

            actor.frames_sent += actor.authority.poll().len();
        }

        oracle(&world)
    }
}
