//! Message taxonomy.
//!
//! Two closed sets, one per direction. Both carry a `type` discriminant.
//!
//! # Protocol Flow
//!
//! ```text
//! client                               authority
//!   │ ── Hello ───────────────────────────> │
//!   │ <──────────────────── HelloResponse ─ │
//!   │ <───────────────────────────  Render ─ │   full tree
//!   │ <─────────────────────── PatchBatch ─ │   incremental
//!   │ ── Event ───────────────────────────> │   callback invoked
//!   │ <──────────────────────── PushPath ── │   navigation
//!   │ ── PathChanged ─────────────────────> │   user pressed back
//! ```

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::{capabilities::Capabilities, element::SerializedElement, patch::Patch};

/// Protocol version carried in `Hello`.
pub const PROTOCOL_VERSION: u16 = 2;

/// Ambient color-scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

/// Opening message of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Identifies the client build or embedding.
    pub client_id: String,
    /// Protocol version the client speaks.
    pub protocol_version: u16,
    /// Effective color scheme (caller override if any, else detected).
    pub color_scheme: ColorScheme,
    /// Detected locale, if the host exposes one.
    #[serde(default)]
    pub locale: Option<String>,
    /// Supported features.
    #[serde(with = "crate::capabilities::bits")]
    pub capabilities: Capabilities,
    /// Starting path. Only sent by clients without a platform-visible address.
    #[serde(default)]
    pub initial_path: Option<String>,
}

/// Authority's answer to `Hello`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloResponse {
    /// Session identity assigned by the authority.
    pub session_id: String,
    /// Informational authority version.
    pub server_version: String,
    /// Diagnostic categories for which the client should trace verbosely.
    #[serde(default)]
    pub debug: Vec<String>,
}

/// Where a remote failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorContext {
    /// Rendering failed. The displayed tree can no longer be trusted.
    Render,
    /// A callback raised. The tree is still valid.
    Callback,
}

/// Failure reported by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Human-readable description.
    pub message: String,
    /// Failure site.
    pub context: ErrorContext,
}

/// User interaction forwarded to the authority.
///
/// Arguments are plain data; platform event objects must be reduced before
/// they reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    /// Callback reference token.
    pub callback_id: String,
    /// Ordered arguments.
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Messages sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Session opening.
    Hello(Hello),
    /// Callback invocation.
    Event(EventMessage),
    /// The local address changed out of band (e.g. the back button).
    PathChanged {
        /// New path.
        path: String,
    },
    /// Any discriminant this version does not know.
    #[serde(other)]
    Unknown,
}

/// Messages sent by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake completion.
    HelloResponse(HelloResponse),
    /// Full tree, replacing whatever the client holds.
    Render {
        /// New root element.
        root: SerializedElement,
    },
    /// Ordered incremental mutations.
    PatchBatch {
        /// Patches, applied in order as one unit.
        patches: Vec<Patch>,
    },
    /// Remote failure.
    Error(RemoteError),
    /// Navigate forward to a path.
    PushPath {
        /// Target path.
        path: String,
    },
    /// Step back in history.
    GoBack,
    /// Step forward in history.
    GoForward,
    /// Reload the host.
    Reload,
    /// Any discriminant this version does not know.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Discriminant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hello(_) => "hello",
            Self::Event(_) => "event",
            Self::PathChanged { .. } => "path_changed",
            Self::Unknown => "unknown",
        }
    }
}

impl ServerMessage {
    /// Discriminant name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HelloResponse(_) => "hello_response",
            Self::Render { .. } => "render",
            Self::PatchBatch { .. } => "patch_batch",
            Self::Error(_) => "error",
            Self::PushPath { .. } => "push_path",
            Self::GoBack => "go_back",
            Self::GoForward => "go_forward",
            Self::Reload => "reload",
            Self::Unknown => "unknown",
        }
    }

    /// Diagnostic category used to gate verbose tracing.
    pub fn category(&self) -> &'static str {
        match self {
            Self::HelloResponse(_) => "session",
            Self::Render { .. } | Self::PatchBatch { .. } => "patches",
            Self::Error(_) => "errors",
            Self::PushPath { .. } | Self::GoBack | Self::GoForward | Self::Reload => "navigation",
            Self::Unknown => "unknown",
        }
    }
}
