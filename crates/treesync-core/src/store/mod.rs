//! ID-keyed mirror of the remote tree.
//!
//! The store holds one immutable [`NodeData`] record per live node, keyed by
//! the id the authority assigned. Updates never mutate a record in place:
//! they build a new one and swap the `Arc`, so consumers can detect change by
//! pointer identity.
//!
//! Two kinds of subscription exist. A node subscription fires when its node
//! was affected by a patch batch; a global subscription fires once per
//! render or non-empty batch. Within a batch every affected node is notified
//! exactly once, however many patches touched it.
//!
//! # Invariants
//!
//! - Every id in a node's `child_ids` is present in the map, except while a
//!   batch is being applied. Violations found after a batch are reported as
//!   [`Diagnostic::DanglingChild`].
//! - The map is acyclic; the authority builds it from a tree.
//! - Listeners registered on a removed node are discarded with it.

mod handle;
mod notify;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

pub use handle::StoreHandle;
pub use notify::{Diagnostic, GlobalListener, NodeListener, PendingNotifications, SubscriptionId};
use treesync_proto::{ElementKind, NodeId, Patch, PropValue, Props, SerializedElement};

/// Store record for one live node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// What the node renders as.
    pub kind: ElementKind,
    /// Component or primitive tag.
    pub element_type: String,
    /// Debug label.
    pub name: String,
    /// Current props.
    pub props: Props,
    /// Ordered child ids.
    pub child_ids: Vec<NodeId>,
}

impl NodeData {
    /// Prop by name.
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }
}

/// Accumulates what a single mutation touched.
#[derive(Default)]
struct BatchState {
    affected: Vec<NodeId>,
    seen: HashSet<NodeId>,
    diagnostics: Vec<Diagnostic>,
}

impl BatchState {
    fn touch(&mut self, id: &NodeId) {
        if self.seen.insert(id.clone()) {
            self.affected.push(id.clone());
        }
    }

    fn violation(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "protocol violation");
        self.diagnostics.push(diagnostic);
    }
}

/// Local mirror of the remote tree with fine-grained subscriptions.
#[derive(Default)]
pub struct TreeStore {
    nodes: HashMap<NodeId, Arc<NodeData>>,
    root_id: Option<NodeId>,
    node_listeners: HashMap<NodeId, BTreeMap<SubscriptionId, NodeListener>>,
    global_listeners: BTreeMap<SubscriptionId, GlobalListener>,
    /// Subscription -> node it watches (`None` for global)
    subscriptions: HashMap<SubscriptionId, Option<NodeId>>,
    next_subscription: u64,
}

impl TreeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole tree.
    ///
    /// Clears every node, inserts `root` recursively and makes it the root.
    /// Every global listener fires once. Node listeners do not fire: after a
    /// reset their ids no longer reliably denote the same thing. Listeners on
    /// ids the new tree does not contain are discarded.
    pub fn set_tree(&mut self, root: &SerializedElement) -> PendingNotifications {
        self.nodes.clear();

        let mut batch = BatchState::default();
        self.root_id = self.insert_subtree(root, None, &mut batch);

        let absent: Vec<NodeId> =
            self.node_listeners.keys().filter(|id| !self.nodes.contains_key(*id)).cloned().collect();
        for id in &absent {
            self.drop_node_listeners(id);
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            root = ?self.root_id,
            released = absent.len(),
            "tree reset"
        );

        PendingNotifications {
            nodes: Vec::new(),
            globals: self.global_listeners.values().cloned().collect(),
            affected: batch.affected,
            diagnostics: batch.diagnostics,
        }
    }

    /// Apply a patch batch in order.
    ///
    /// Patches that reference missing nodes are dropped with a diagnostic;
    /// the rest of the batch still applies. Each affected node that is still
    /// present afterwards is notified once, then global listeners fire once
    /// if anything was affected.
    pub fn apply_patches(&mut self, patches: &[Patch]) -> PendingNotifications {
        let mut batch = BatchState::default();

        for patch in patches {
            self.apply_patch(patch, &mut batch);
        }

        self.check_children(&mut batch);

        let mut nodes = Vec::new();
        for id in &batch.affected {
            let (Some(node), Some(listeners)) = (self.nodes.get(id), self.node_listeners.get(id))
            else {
                continue;
            };
            for listener in listeners.values() {
                nodes.push((Arc::clone(listener), id.clone(), Arc::clone(node)));
            }
        }

        let globals = if batch.affected.is_empty() {
            Vec::new()
        } else {
            self.global_listeners.values().cloned().collect()
        };

        tracing::trace!(
            patches = patches.len(),
            affected = batch.affected.len(),
            dropped = batch.diagnostics.len(),
            "patch batch applied"
        );

        PendingNotifications { nodes, globals, affected: batch.affected, diagnostics: batch.diagnostics }
    }

    /// Node record by id.
    pub fn node(&self, id: &str) -> Option<Arc<NodeData>> {
        self.nodes.get(id).cloned()
    }

    /// Whether a node is present.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Current root id.
    pub fn root_id(&self) -> Option<&NodeId> {
        self.root_id.as_ref()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all live nodes in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Arc<NodeData>)> {
        self.nodes.iter()
    }

    /// Subscribe to changes of one node.
    ///
    /// The node does not have to exist yet. The subscription is discarded if
    /// the node is removed, or if a full render leaves it absent.
    pub fn subscribe_node<F>(&mut self, id: impl Into<NodeId>, listener: F) -> SubscriptionId
    where
        F: Fn(&NodeId, &Arc<NodeData>) + Send + Sync + 'static,
    {
        let id = id.into();
        let subscription = self.next_id();
        self.node_listeners.entry(id.clone()).or_default().insert(subscription, Arc::new(listener));
        self.subscriptions.insert(subscription, Some(id));
        subscription
    }

    /// Subscribe to any change of the tree.
    pub fn subscribe_global<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscription = self.next_id();
        self.global_listeners.insert(subscription, Arc::new(listener));
        self.subscriptions.insert(subscription, None);
        subscription
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        match self.subscriptions.remove(&subscription) {
            Some(Some(id)) => {
                if let Some(listeners) = self.node_listeners.get_mut(&id) {
                    listeners.remove(&subscription);
                    if listeners.is_empty() {
                        self.node_listeners.remove(&id);
                    }
                }
                true
            },
            Some(None) => self.global_listeners.remove(&subscription).is_some(),
            None => false,
        }
    }

    /// Number of listeners registered on a node.
    pub fn node_listener_count(&self, id: &str) -> usize {
        self.node_listeners.get(id).map_or(0, BTreeMap::len)
    }

    /// Number of live subscriptions of either kind.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    fn apply_patch(&mut self, patch: &Patch, batch: &mut BatchState) {
        match patch {
            Patch::Add { parent_id: Some(parent), child_order, subtree } => {
                let Some(parent_node) = self.nodes.get(parent).cloned() else {
                    batch.violation(Diagnostic::MissingParent {
                        parent: parent.clone(),
                        subtree: subtree.key.clone(),
                    });
                    return;
                };

                self.insert_replacing(subtree, Some(parent), batch);

                let updated = NodeData { child_ids: child_order.clone(), ..NodeData::clone(&parent_node) };
                self.nodes.insert(parent.clone(), Arc::new(updated));
                batch.touch(parent);
            },

            Patch::Add { parent_id: None, subtree, .. } => {
                if let Some(id) = self.insert_replacing(subtree, None, batch) {
                    tracing::debug!(root = %id, "root replaced");
                    self.root_id = Some(id);
                }
            },

            Patch::Update { id, props, child_order } => {
                let Some(current) = self.nodes.get(id) else {
                    batch.violation(Diagnostic::UnknownTarget { op: "update", id: id.clone() });
                    return;
                };

                let mut next = NodeData::clone(current);
                if let Some(delta) = props {
                    for (name, value) in delta {
                        match value {
                            Some(value) => {
                                next.props.insert(name.clone(), value.clone());
                            },
                            None => {
                                next.props.remove(name);
                            },
                        }
                    }
                }
                if let Some(order) = child_order {
                    next.child_ids.clone_from(order);
                }

                self.nodes.insert(id.clone(), Arc::new(next));
                batch.touch(id);
            },

            Patch::Remove { id } => {
                if !self.nodes.contains_key(id) {
                    batch.violation(Diagnostic::UnknownTarget { op: "remove", id: id.clone() });
                    return;
                }

                for removed in self.subtree_ids(id) {
                    self.nodes.remove(&removed);
                    self.drop_node_listeners(&removed);
                    batch.touch(&removed);
                }

                if self.root_id.as_ref().is_some_and(|root| !self.nodes.contains_key(root)) {
                    self.root_id = None;
                }
            },
        }
    }

    /// Insert a subtree whose root id may already be present.
    ///
    /// Descendants the existing node had that the new subtree does not
    /// contain are removed along with their listeners.
    fn insert_replacing(
        &mut self,
        element: &SerializedElement,
        parent: Option<&NodeId>,
        batch: &mut BatchState,
    ) -> Option<NodeId> {
        let previous = match &element.key {
            Some(id) if self.nodes.contains_key(id) => self.subtree_ids(id),
            _ => Vec::new(),
        };

        let id = self.insert_subtree(element, parent, batch)?;
        if previous.is_empty() {
            return Some(id);
        }

        let live: HashSet<NodeId> = self.subtree_ids(&id).into_iter().collect();
        for stale in previous.iter().filter(|old| !live.contains(*old)) {
            self.nodes.remove(stale);
            self.drop_node_listeners(stale);
            batch.touch(stale);
        }
        tracing::debug!(%id, replaced = previous.len(), "existing node replaced by add");

        Some(id)
    }

    /// Insert an element and its descendants. Returns the element's id, or
    /// `None` if it had no key and was skipped.
    fn insert_subtree(
        &mut self,
        element: &SerializedElement,
        parent: Option<&NodeId>,
        batch: &mut BatchState,
    ) -> Option<NodeId> {
        let Some(id) = element.key.clone() else {
            batch.violation(Diagnostic::MissingKey {
                parent: parent.cloned(),
                element_type: element.element_type.clone(),
            });
            return None;
        };

        let child_ids = element
            .children
            .iter()
            .filter_map(|child| self.insert_subtree(child, Some(&id), batch))
            .collect();

        self.nodes.insert(
            id.clone(),
            Arc::new(NodeData {
                kind: element.kind,
                element_type: element.element_type.clone(),
                name: element.name.clone(),
                props: element.props.clone(),
                child_ids,
            }),
        );
        batch.touch(&id);

        Some(id)
    }

    /// `id` and every node reachable from it through `child_ids`.
    fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut stack = vec![id.clone()];
        let mut out = Vec::new();

        while let Some(next) = stack.pop() {
            if !visited.insert(next.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&next) {
                stack.extend(node.child_ids.iter().rev().cloned());
                out.push(next);
            }
        }

        out
    }

    fn drop_node_listeners(&mut self, id: &NodeId) {
        if let Some(listeners) = self.node_listeners.remove(id) {
            for subscription in listeners.keys() {
                self.subscriptions.remove(subscription);
            }
        }
    }

    fn check_children(&self, batch: &mut BatchState) {
        let mut dangling = Vec::new();
        for id in &batch.affected {
            let Some(node) = self.nodes.get(id) else { continue };
            for child in &node.child_ids {
                if !self.nodes.contains_key(child) {
                    dangling.push(Diagnostic::DanglingChild { parent: id.clone(), child: child.clone() });
                }
            }
        }
        for diagnostic in dangling {
            batch.violation(diagnostic);
        }
    }
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("nodes", &self.nodes.len())
            .field("root_id", &self.root_id)
            .field("subscriptions", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use treesync_proto::Value;

    use super::*;

    fn scenario_tree() -> SerializedElement {
        SerializedElement::component("App")
            .with_key("root")
            .with_child(SerializedElement::component("Label").with_key("e1").with_prop("text", "Hi"))
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&NodeId, &Arc<NodeData>) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &NodeId, _: &Arc<NodeData>| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn text(store: &TreeStore, id: &str) -> Option<String> {
        store.node(id)?.prop("text")?.as_text().map(str::to_string)
    }

    #[test]
    fn scenario_set_tree_then_update() {
        let mut store = TreeStore::new();
        let diagnostics = store.set_tree(&scenario_tree()).fire();
        assert!(diagnostics.is_empty());

        assert_eq!(text(&store, "e1").as_deref(), Some("Hi"));
        assert_eq!(store.root_id().map(NodeId::as_str), Some("root"));

        let (e1_count, e1_listener) = counter();
        let (root_count, root_listener) = counter();
        store.subscribe_node("e1", e1_listener);
        store.subscribe_node("root", root_listener);

        let _ = store
            .apply_patches(&[Patch::update_props("e1", [("text", Some(PropValue::from("Bye")))])])
            .fire();

        assert_eq!(text(&store, "e1").as_deref(), Some("Bye"));
        assert_eq!(e1_count.load(Ordering::SeqCst), 1);
        assert_eq!(root_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_tree_fires_global_only() {
        let mut store = TreeStore::new();
        let (node_count, node_listener) = counter();
        store.subscribe_node("e1", node_listener);

        let globals = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&globals);
        store.subscribe_global(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        let _ = store.set_tree(&scenario_tree()).fire();

        assert_eq!(globals.load(Ordering::SeqCst), 1);
        assert_eq!(node_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_tree_twice_is_idempotent() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();
        let first: Vec<_> = ["root", "e1"].iter().map(|id| store.node(id)).collect();

        let _ = store.set_tree(&scenario_tree()).fire();
        let second: Vec<_> = ["root", "e1"].iter().map(|id| store.node(id)).collect();

        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn set_tree_clears_previous_nodes() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();
        let _ = store.set_tree(&SerializedElement::component("Other").with_key("r2")).fire();

        assert!(!store.contains("e1"));
        assert!(!store.contains("root"));
        assert_eq!(store.root_id().map(NodeId::as_str), Some("r2"));
    }

    #[test]
    fn batch_notifies_each_node_once() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let (root_count, root_listener) = counter();
        store.subscribe_node("root", root_listener);

        let globals = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&globals);
        store.subscribe_global(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        // Add touches root's child order; the update touches root again.
        let pending = store.apply_patches(&[
            Patch::Add {
                parent_id: Some("root".into()),
                child_order: vec!["e1".into(), "e2".into()],
                subtree: SerializedElement::component("Label").with_key("e2"),
            },
            Patch::update_props("root", [("title", Some(PropValue::from("t")))]),
        ]);
        assert_eq!(pending.node_notifications(), 1);
        let _ = pending.fire();

        assert_eq!(root_count.load(Ordering::SeqCst), 1);
        assert_eq!(globals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_builds_new_record() {
        let mut store = TreeStore::new();
        let tree = scenario_tree();
        let tree = SerializedElement {
            children: vec![tree.children[0].clone().with_prop("color", "red")],
            ..tree
        };
        let _ = store.set_tree(&tree).fire();

        let before = store.node("e1").unwrap();
        let _ = store
            .apply_patches(&[Patch::update_props("e1", [("text", Some(PropValue::from("Bye")))])])
            .fire();
        let after = store.node("e1").unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.prop("color"), after.prop("color"));
        assert_eq!(before.child_ids, after.child_ids);
        assert_eq!(before.prop("text").and_then(PropValue::as_text), Some("Hi"));
    }

    #[test]
    fn deletion_marker_removes_key() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let _ = store.apply_patches(&[Patch::update_props("e1", [("text", None)])]).fire();

        let node = store.node("e1").unwrap();
        assert!(!node.props.contains_key("text"));
    }

    #[test]
    fn explicit_null_is_kept() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let _ = store
            .apply_patches(&[Patch::update_props("e1", [("text", Some(PropValue::Value(Value::Null)))])])
            .fire();

        let node = store.node("e1").unwrap();
        assert_eq!(node.prop("text"), Some(&PropValue::Value(Value::Null)));
    }

    #[test]
    fn child_order_replaced_not_merged() {
        let mut store = TreeStore::new();
        let tree = SerializedElement::component("List")
            .with_key("list")
            .with_child(SerializedElement::text("a").with_key("a"))
            .with_child(SerializedElement::text("b").with_key("b"));
        let _ = store.set_tree(&tree).fire();

        let _ = store
            .apply_patches(&[Patch::Update {
                id: "list".into(),
                props: None,
                child_order: Some(vec!["b".into(), "a".into()]),
            }])
            .fire();

        let list = store.node("list").unwrap();
        assert_eq!(list.child_ids, vec![NodeId::from("b"), NodeId::from("a")]);
    }

    #[test]
    fn remove_is_recursive_and_drops_listeners() {
        let mut store = TreeStore::new();
        let tree = SerializedElement::component("App").with_key("root").with_child(
            SerializedElement::component("Panel")
                .with_key("panel")
                .with_child(SerializedElement::text("x").with_key("leaf")),
        );
        let _ = store.set_tree(&tree).fire();

        let (leaf_count, leaf_listener) = counter();
        store.subscribe_node("leaf", leaf_listener);
        assert_eq!(store.node_listener_count("leaf"), 1);

        let _ = store
            .apply_patches(&[
                Patch::remove("panel"),
                Patch::Update { id: "root".into(), props: None, child_order: Some(Vec::new()) },
            ])
            .fire();

        assert!(!store.contains("panel"));
        assert!(!store.contains("leaf"));
        assert_eq!(store.node_listener_count("leaf"), 0);
        assert_eq!(store.subscription_count(), 0);

        // The id is reused; the old listener must stay silent.
        let _ = store
            .apply_patches(&[Patch::Add {
                parent_id: Some("root".into()),
                child_order: vec!["leaf".into()],
                subtree: SerializedElement::text("y").with_key("leaf"),
            }])
            .fire();
        assert_eq!(leaf_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_targets_do_not_stop_the_batch() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let diagnostics = store
            .apply_patches(&[
                Patch::update_props("ghost", [("text", Some(PropValue::from("x")))]),
                Patch::remove("phantom"),
                Patch::update_props("e1", [("text", Some(PropValue::from("Bye")))]),
            ])
            .fire();

        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::UnknownTarget { op: "update", id: "ghost".into() },
                Diagnostic::UnknownTarget { op: "remove", id: "phantom".into() },
            ]
        );
        assert_eq!(text(&store, "e1").as_deref(), Some("Bye"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_under_missing_parent_is_dropped() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let diagnostics = store
            .apply_patches(&[Patch::Add {
                parent_id: Some("nowhere".into()),
                child_order: vec!["orphan".into()],
                subtree: SerializedElement::text("o").with_key("orphan"),
            }])
            .fire();

        assert!(matches!(diagnostics.as_slice(), [Diagnostic::MissingParent { .. }]));
        assert!(!store.contains("orphan"));
        assert!(!store.contains("nowhere"));
    }

    #[test]
    fn add_without_parent_replaces_root() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let _ = store
            .apply_patches(&[Patch::Add {
                parent_id: None,
                child_order: Vec::new(),
                subtree: SerializedElement::component("App2").with_key("root2"),
            }])
            .fire();

        assert_eq!(store.root_id().map(NodeId::as_str), Some("root2"));
    }

    #[test]
    fn later_patch_may_reference_earlier_add() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let diagnostics = store
            .apply_patches(&[
                Patch::Add {
                    parent_id: Some("root".into()),
                    child_order: vec!["e1".into(), "box".into()],
                    subtree: SerializedElement::element("div").with_key("box"),
                },
                Patch::Add {
                    parent_id: Some("box".into()),
                    child_order: vec!["inner".into()],
                    subtree: SerializedElement::text("in").with_key("inner"),
                },
            ])
            .fire();

        assert!(diagnostics.is_empty());
        assert_eq!(store.node("box").unwrap().child_ids, vec![NodeId::from("inner")]);
    }

    #[test]
    fn missing_key_is_skipped() {
        let mut store = TreeStore::new();
        let tree = SerializedElement::component("App")
            .with_key("root")
            .with_child(SerializedElement::text("keyless"))
            .with_child(SerializedElement::text("kept").with_key("k"));

        let diagnostics = store.set_tree(&tree).fire();

        assert!(matches!(diagnostics.as_slice(), [Diagnostic::MissingKey { .. }]));
        assert_eq!(store.node("root").unwrap().child_ids, vec![NodeId::from("k")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn dangling_child_after_batch_is_reported() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let diagnostics = store
            .apply_patches(&[Patch::Update {
                id: "root".into(),
                props: None,
                child_order: Some(vec!["e1".into(), "later".into()]),
            }])
            .fire();

        assert_eq!(
            diagnostics,
            vec![Diagnostic::DanglingChild { parent: "root".into(), child: "later".into() }]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let (count, listener) = counter();
        let subscription = store.subscribe_node("e1", listener);
        assert!(store.unsubscribe(subscription));
        assert!(!store.unsubscribe(subscription));

        let _ = store.apply_patches(&[Patch::update_props("e1", [("text", None)])]).fire();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_sees_post_batch_state() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        store.subscribe_node("e1", move |_, node| {
            let text = node.prop("text").and_then(PropValue::as_text).map(str::to_string);
            inner.lock().unwrap().push(text);
        });

        let _ = store
            .apply_patches(&[
                Patch::update_props("e1", [("text", Some(PropValue::from("one")))]),
                Patch::update_props("e1", [("text", Some(PropValue::from("two")))]),
            ])
            .fire();

        assert_eq!(*seen.lock().unwrap(), vec![Some("two".to_string())]);
    }

    #[test]
    fn empty_batch_fires_nothing() {
        let mut store = TreeStore::new();
        let globals = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&globals);
        store.subscribe_global(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        let _ = store.apply_patches(&[]).fire();
        let _ = store.apply_patches(&[Patch::remove("ghost")]).fire();
        assert_eq!(globals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn add_over_existing_id_releases_old_descendants() {
        let mut store = TreeStore::new();
        let tree = SerializedElement::component("App").with_key("root").with_child(
            SerializedElement::component("Panel")
                .with_key("panel")
                .with_child(SerializedElement::text("old").with_key("stale"))
                .with_child(SerializedElement::text("kept").with_key("kept")),
        );
        let _ = store.set_tree(&tree).fire();

        let (stale_count, stale_listener) = counter();
        let (panel_count, panel_listener) = counter();
        store.subscribe_node("stale", stale_listener);
        store.subscribe_node("panel", panel_listener);

        let diagnostics = store
            .apply_patches(&[Patch::Add {
                parent_id: Some("root".into()),
                child_order: vec!["panel".into()],
                subtree: SerializedElement::component("Panel")
                    .with_key("panel")
                    .with_child(SerializedElement::text("kept").with_key("kept")),
            }])
            .fire();

        assert!(diagnostics.is_empty());
        assert!(!store.contains("stale"));
        assert!(store.contains("kept"));
        assert_eq!(store.len(), 3);
        assert_eq!(store.node_listener_count("stale"), 0);
        assert_eq!(store.subscription_count(), 1);
        assert_eq!(stale_count.load(Ordering::SeqCst), 0);
        assert_eq!(panel_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_tree_releases_listeners_of_absent_ids() {
        let mut store = TreeStore::new();
        let _ = store.set_tree(&scenario_tree()).fire();

        let (e1_count, e1_listener) = counter();
        let (root_count, root_listener) = counter();
        store.subscribe_node("e1", e1_listener);
        store.subscribe_node("root", root_listener);

        let _ = store.set_tree(&SerializedElement::component("App").with_key("root")).fire();

        assert_eq!(store.node_listener_count("e1"), 0);
        assert_eq!(store.node_listener_count("root"), 1);
        assert_eq!(store.subscription_count(), 1);

        let _ = store
            .apply_patches(&[Patch::update_props("root", [("title", Some(PropValue::from("x")))])])
            .fire();
        assert_eq!(root_count.load(Ordering::SeqCst), 1);
        assert_eq!(e1_count.load(Ordering::SeqCst), 0);
    }
}
