//! Reusable oracle checks.
//!
//! Each check returns `Err` with a description of the first mismatch so
//! oracles can chain them with `?`.

use std::collections::BTreeMap;

use treesync_client::{Client, ViewState, transports::SocketTransport};
use treesync_core::{ConnectionState, NodeData};
use treesync_proto::{NodeId, PropValue};

use super::World;

fn lookup<'w>(
    world: &'w World,
    name: &str,
) -> Result<&'w Client<SocketTransport>, String> {
    world.client(name).ok_or_else(|| format!("client {name} does not exist"))
}

/// Every client completed its handshake.
pub fn all_connected(world: &World) -> Result<(), String> {
    for name in world.client_names() {
        let state = lookup(world, &name)?.state();
        if state != ConnectionState::Connected {
            return Err(format!("client {name} should be Connected, got {state:?}"));
        }
    }
    Ok(())
}

/// A client holds the expected session id.
pub fn session_id(world: &World, name: &str, expected: &str) -> Result<(), String> {
    match lookup(world, name)?.session_id() {
        Some(id) if id == expected => Ok(()),
        other => Err(format!("client {name} session id should be {expected}, got {other:?}")),
    }
}

/// A client presents the expected view.
pub fn view(world: &World, name: &str, expected: &ViewState) -> Result<(), String> {
    let actual = lookup(world, name)?.view();
    if actual == expected {
        Ok(())
    } else {
        Err(format!("client {name} view should be {expected:?}, got {actual:?}"))
    }
}

/// A node's text prop has the expected value.
pub fn node_text(world: &World, name: &str, id: &str, expected: &str) -> Result<(), String> {
    let node = lookup(world, name)?
        .store()
        .node(id)
        .ok_or_else(|| format!("client {name} has no node {id}"))?;

    match node.prop("text").and_then(PropValue::as_text) {
        Some(text) if text == expected => Ok(()),
        other => Err(format!("client {name} node {id} text should be {expected:?}, got {other:?}")),
    }
}

/// A node is absent.
pub fn node_absent(world: &World, name: &str, id: &str) -> Result<(), String> {
    if lookup(world, name)?.store().node(id).is_some() {
        return Err(format!("client {name} still holds node {id}"));
    }
    Ok(())
}

fn snapshot(world: &World, name: &str) -> Result<BTreeMap<NodeId, NodeData>, String> {
    let client = lookup(world, name)?;
    Ok(client
        .store()
        .read(|store| store.nodes().map(|(id, node)| (id.clone(), NodeData::clone(node))).collect()))
}

/// Every client mirrors the same tree.
pub fn stores_converged(world: &World) -> Result<(), String> {
    let names = world.client_names();
    let Some((first, rest)) = names.split_first() else {
        return Ok(());
    };

    let reference = snapshot(world, first)?;
    for name in rest {
        if snapshot(world, name)? != reference {
            return Err(format!("client {name} store differs from client {first}"));
        }
    }
    Ok(())
}
