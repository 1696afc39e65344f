//! Incremental tree mutations.
//!
//! The authority diffs successive renders and sends the difference as an
//! ordered batch of patches. Order inside a batch matters: a later patch may
//! reference a node an earlier patch in the same batch created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::{NodeId, PropValue, SerializedElement};

/// Prop changes carried by an update.
///
/// `None` is the deletion marker: the key is removed from the node, not set
/// to a null value. An explicit null value is `Some(PropValue::Value(Null))`.
pub type PropsDelta = BTreeMap<String, Option<PropValue>>;

/// One mutation of the mirrored tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    /// Insert a subtree.
    Add {
        /// Parent the subtree is inserted under. `None` makes the subtree the
        /// new root.
        parent_id: Option<NodeId>,
        /// Complete child order of the parent after the insert. Replaces the
        /// parent's order outright.
        #[serde(default)]
        child_order: Vec<NodeId>,
        /// The inserted subtree.
        subtree: SerializedElement,
    },

    /// Change props and/or child order of an existing node.
    Update {
        /// Target node.
        id: NodeId,
        /// Prop overlay. Absent means props are unchanged.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        props: Option<PropsDelta>,
        /// New child order. Absent means the order is unchanged.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        child_order: Option<Vec<NodeId>>,
    },

    /// Delete a node and all of its descendants.
    Remove {
        /// Target node.
        id: NodeId,
    },
}

impl Patch {
    /// Node the patch is addressed to. For an add this is the parent, or the
    /// subtree root when the add replaces the root.
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Self::Add { parent_id: Some(parent), .. } => Some(parent),
            Self::Add { parent_id: None, subtree, .. } => subtree.key.as_ref(),
            Self::Update { id, .. } | Self::Remove { id } => Some(id),
        }
    }

    /// Short operation name for logging.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
        }
    }

    /// Update that only overlays props.
    pub fn update_props<I, K>(id: impl Into<NodeId>, props: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<PropValue>)>,
        K: Into<String>,
    {
        Self::Update {
            id: id.into(),
            props: Some(props.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            child_order: None,
        }
    }

    /// Removal of a node.
    pub fn remove(id: impl Into<NodeId>) -> Self {
        Self::Remove { id: id.into() }
    }
}
