//! Fragment routing: the URL fragment is the address.

use treesync_proto::ClientMessage;

use super::{
    HistoryPlatform, ListenerToken, PlatformSignal, ROOT_PATH, Router, RoutingMode, path_changed,
};

/// Router backed by the URL fragment.
///
/// Fragment changes are real history entries, so back and forward still
/// delegate to the platform. A push fires the platform's fragment-change
/// signal for the push itself; that echo is swallowed.
pub struct FragmentRouter {
    platform: Box<dyn HistoryPlatform>,
    listener: Option<ListenerToken>,
    /// Path of a push whose `HashChange` has not arrived yet
    pending_echo: Option<String>,
}

impl FragmentRouter {
    /// Create the router and start listening for `HashChange`.
    pub fn new(mut platform: Box<dyn HistoryPlatform>) -> Self {
        let listener = Some(platform.listen(PlatformSignal::HashChange));
        Self { platform, listener, pending_echo: None }
    }
}

/// `"/a"`, `"a"` and `"#/a"` all mean `/a`; empty means root.
fn normalize(fragment: &str) -> String {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        ROOT_PATH.to_string()
    } else if fragment.starts_with('/') {
        fragment.to_string()
    } else {
        format!("/{fragment}")
    }
}

impl Router for FragmentRouter {
    fn mode(&self) -> RoutingMode {
        RoutingMode::Fragment
    }

    fn push_state(&mut self, path: &str) {
        let path = normalize(path);
        if path == self.current_path() {
            // Same fragment: the platform adds no entry and fires nothing.
            return;
        }

        tracing::debug!(%path, "fragment push");
        self.pending_echo = Some(path.clone());
        self.platform.push_fragment(&path);
    }

    fn back(&mut self) -> Option<ClientMessage> {
        self.pending_echo = None;
        self.platform.back();
        None
    }

    fn forward(&mut self) -> Option<ClientMessage> {
        self.pending_echo = None;
        self.platform.forward();
        None
    }

    fn current_path(&self) -> String {
        normalize(&self.platform.fragment())
    }

    fn on_platform_signal(&mut self, signal: PlatformSignal) -> Option<ClientMessage> {
        if self.listener.is_none() || signal != PlatformSignal::HashChange {
            return None;
        }

        let path = self.current_path();
        if self.pending_echo.take().is_some_and(|pushed| pushed == path) {
            return None;
        }
        Some(path_changed(path))
    }

    fn destroy(&mut self) {
        if let Some(token) = self.listener.take() {
            self.platform.unlisten(token);
        }
        self.pending_echo = None;
    }
}
