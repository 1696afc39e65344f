//! Tree elements as rendered by the remote authority.

use std::{borrow::Borrow, collections::BTreeMap, fmt};

use ciborium::Value;
use serde::{Deserialize, Serialize};

/// Stable identity of a node, assigned by the authority.
///
/// Unique within the current tree. The store keys everything by this value,
/// so "this node changed" and "this node was replaced" are distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What an element renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// A named component resolved by the presentation layer.
    Component,
    /// A primitive element (div, span, ...).
    Element,
    /// A text leaf.
    Text,
}

/// Opaque token standing in for a handler that lives on the authority.
///
/// Must be turned into an invocable handle by the client before use; invoking
/// it sends an `Event` carrying this token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallbackRef {
    /// Token the authority uses to look the handler up.
    pub id: String,
}

/// A value plus the reference it came from, for two-way state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Reference the authority resolves to the bound state.
    pub reference: String,
    /// Current value of the bound state.
    pub value: Value,
}

/// A single prop value.
///
/// Closed set at the protocol boundary: consumers match on the variant rather
/// than inspecting the payload to guess what it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropValue {
    /// Plain data.
    Value(Value),
    /// Handler reference.
    Callback(CallbackRef),
    /// Two-way binding.
    Binding(Binding),
}

impl PropValue {
    /// Text content if this is a plain text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Value(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Callback reference, if any.
    pub fn as_callback(&self) -> Option<&CallbackRef> {
        match self {
            Self::Callback(callback) => Some(callback),
            _ => None,
        }
    }

    /// Binding, if any.
    pub fn as_binding(&self) -> Option<&Binding> {
        match self {
            Self::Binding(binding) => Some(binding),
            _ => None,
        }
    }

    /// Build a callback prop.
    pub fn callback(id: impl Into<String>) -> Self {
        Self::Callback(CallbackRef { id: id.into() })
    }

    /// Build a binding prop.
    pub fn binding(reference: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Binding(Binding { reference: reference.into(), value: value.into() })
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for PropValue {
    fn from(text: &str) -> Self {
        Self::Value(Value::Text(text.to_string()))
    }
}

impl From<String> for PropValue {
    fn from(text: String) -> Self {
        Self::Value(Value::Text(text))
    }
}

impl From<bool> for PropValue {
    fn from(flag: bool) -> Self {
        Self::Value(Value::Bool(flag))
    }
}

impl From<i64> for PropValue {
    fn from(number: i64) -> Self {
        Self::Value(Value::Integer(number.into()))
    }
}

/// Prop map of an element. Key order carries no meaning.
pub type Props = BTreeMap<String, PropValue>;

/// An element subtree in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedElement {
    /// What the element renders as.
    pub kind: ElementKind,
    /// Component or primitive tag.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Debug label.
    #[serde(default)]
    pub name: String,
    /// Identity within the current tree. Required for every node the store
    /// keeps.
    #[serde(default)]
    pub key: Option<NodeId>,
    /// Element props.
    #[serde(default)]
    pub props: Props,
    /// Ordered children.
    #[serde(default)]
    pub children: Vec<SerializedElement>,
}

impl SerializedElement {
    /// Element of the given kind and tag with no key, props or children.
    pub fn new(kind: ElementKind, element_type: impl Into<String>) -> Self {
        let element_type = element_type.into();
        Self {
            kind,
            name: element_type.clone(),
            element_type,
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Component element.
    pub fn component(element_type: impl Into<String>) -> Self {
        Self::new(ElementKind::Component, element_type)
    }

    /// Primitive element.
    pub fn element(element_type: impl Into<String>) -> Self {
        Self::new(ElementKind::Element, element_type)
    }

    /// Text leaf carrying its content in the `text` prop.
    pub fn text(content: impl Into<String>) -> Self {
        let content: String = content.into();
        Self::new(ElementKind::Text, "#text").with_prop("text", content)
    }

    /// Set the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<NodeId>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set a prop.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Number of elements in this subtree, including the root.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always false; a subtree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }
}
