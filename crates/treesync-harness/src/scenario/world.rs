//! World state for scenario execution.
//!
//! The World owns every client together with the authority it talks to,
//! counts frames in each direction, and keeps the actions each client
//! produced for the oracle.

use std::collections::BTreeMap;

use treesync_client::{Client, ClientAction, transports::SocketTransport};
use treesync_core::ConnectionState;

use crate::authority::SimAuthority;

/// One client and the authority side of its session.
#[derive(Debug)]
pub struct ClientActor {
    /// The client under test.
    pub client: Client<SocketTransport>,
    /// Its scripted authority.
    pub authority: SimAuthority,
    /// Actions the client produced, in order.
    pub actions: Vec<ClientAction>,
    /// Frames the client sent.
    pub frames_sent: usize,
    /// Frames the client received.
    pub frames_received: usize,
}

/// World state containing all actors.
#[derive(Debug, Default)]
pub struct World {
    actors: BTreeMap<String, ClientActor>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and its authority.
    pub fn add_client(
        &mut self,
        name: impl Into<String>,
        client: Client<SocketTransport>,
        authority: SimAuthority,
    ) {
        let actor =
            ClientActor { client, authority, actions: Vec::new(), frames_sent: 0, frames_received: 0 };
        self.actors.insert(name.into(), actor);
    }

    /// Actor by name.
    pub fn actor(&self, name: &str) -> Option<&ClientActor> {
        self.actors.get(name)
    }

    /// Mutable actor by name.
    pub fn actor_mut(&mut self, name: &str) -> Option<&mut ClientActor> {
        self.actors.get_mut(name)
    }

    /// Client by name.
    pub fn client(&self, name: &str) -> Option<&Client<SocketTransport>> {
        self.actor(name).map(|a| &a.client)
    }

    /// Authority serving a client.
    pub fn authority(&self, name: &str) -> Option<&SimAuthority> {
        self.actor(name).map(|a| &a.authority)
    }

    /// Actions a client produced.
    pub fn actions(&self, name: &str) -> &[ClientAction] {
        self.actor(name).map_or(&[], |a| a.actions.as_slice())
    }

    /// Frames sent by a client.
    pub fn frames_sent(&self, name: &str) -> usize {
        self.actor(name).map_or(0, |a| a.frames_sent)
    }

    /// Frames received by a client.
    pub fn frames_received(&self, name: &str) -> usize {
        self.actor(name).map_or(0, |a| a.frames_received)
    }

    /// Client names in sorted order.
    pub fn client_names(&self) -> Vec<String> {
        self.actors.keys().cloned().collect()
    }

    /// Whether every client completed its handshake.
    pub fn all_connected(&self) -> bool {
        self.actors.values().all(|a| a.client.state() == ConnectionState::Connected)
    }
}
