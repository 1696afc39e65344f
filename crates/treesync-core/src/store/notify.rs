//! Listener bookkeeping and deferred notification.

use std::sync::Arc;

use thiserror::Error;
use treesync_proto::NodeId;

use super::NodeData;

/// Listener for one node. Receives the node's id and its current record.
pub type NodeListener = Arc<dyn Fn(&NodeId, &Arc<NodeData>) + Send + Sync>;

/// Listener for any change to the tree.
pub type GlobalListener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by a subscribe call, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(super) u64);

/// Protocol violation detected while applying a render or patch batch.
///
/// Never fatal: the offending element or patch is dropped and processing
/// continues with the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// An add referenced a parent the store does not hold.
    #[error("add dropped: parent {parent} does not exist")]
    MissingParent {
        /// Parent the add referenced.
        parent: NodeId,
        /// Root of the dropped subtree, if it had a key.
        subtree: Option<NodeId>,
    },

    /// An update or remove referenced a node the store does not hold.
    #[error("{op} dropped: node {id} does not exist")]
    UnknownTarget {
        /// Patch operation name.
        op: &'static str,
        /// Missing node.
        id: NodeId,
    },

    /// An element arrived without a key. It and its subtree were skipped.
    #[error("{element_type} element without key skipped (parent {parent:?})")]
    MissingKey {
        /// Parent the element was nested under, if any.
        parent: Option<NodeId>,
        /// Tag of the skipped element.
        element_type: String,
    },

    /// After a batch, a node lists a child the store does not hold.
    #[error("node {parent} lists missing child {child}")]
    DanglingChild {
        /// Node whose child order is inconsistent.
        parent: NodeId,
        /// Missing child.
        child: NodeId,
    },
}

/// Notifications collected during one store mutation.
///
/// Listeners are resolved while the store is borrowed but invoked only by
/// [`fire`](Self::fire), after the mutation is complete. A subscriber never
/// observes a partially applied batch, and may read the store from inside
/// its callback.
#[must_use = "listeners are not invoked until the notifications are fired"]
#[derive(Default)]
pub struct PendingNotifications {
    pub(super) nodes: Vec<(NodeListener, NodeId, Arc<NodeData>)>,
    pub(super) globals: Vec<GlobalListener>,
    pub(super) affected: Vec<NodeId>,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl PendingNotifications {
    /// Ids touched by the mutation, in first-touch order, each once.
    pub fn affected(&self) -> &[NodeId] {
        &self.affected
    }

    /// Protocol violations detected during the mutation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of node listener invocations pending.
    pub fn node_notifications(&self) -> usize {
        self.nodes.len()
    }

    /// Invoke node listeners, then global listeners. Returns the diagnostics.
    pub fn fire(self) -> Vec<Diagnostic> {
        for (listener, id, node) in &self.nodes {
            listener(id, node);
        }
        for listener in &self.globals {
            listener();
        }
        self.diagnostics
    }
}

impl std::fmt::Debug for PendingNotifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingNotifications")
            .field("nodes", &self.nodes.len())
            .field("globals", &self.globals.len())
            .field("affected", &self.affected)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
