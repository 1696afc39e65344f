//! Presentation state and the actions the client hands to its host.

use treesync_core::Diagnostic;

/// What the presentation layer should show.
///
/// Render failures and lost connections are distinct states so a user can
/// tell "the app crashed" from "we lost the connection".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Handshake in progress.
    Connecting,
    /// Render the tree store.
    Ready,
    /// The authority failed to render. The tree is frozen until the next
    /// full render.
    RenderError {
        /// Authority's description.
        message: String,
    },
    /// No session. `reason` is `None` before the first connect.
    Disconnected {
        /// Why the session ended.
        reason: Option<String>,
    },
}

impl ViewState {
    /// Whether the tree store should be rendered.
    pub fn shows_tree(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Actions produced by the client for the host to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// The presentation state changed.
    ViewChanged(ViewState),

    /// A callback failed remotely. The current view stays.
    CallbackError {
        /// Authority's description.
        message: String,
    },

    /// The authority asked the host to reload.
    Reload,

    /// Protocol violations found while applying a render or patch batch.
    Diagnostics(Vec<Diagnostic>),
}
