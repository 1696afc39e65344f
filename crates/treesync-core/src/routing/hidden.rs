//! Hidden routing: no platform address, internal history list.

use treesync_proto::ClientMessage;

use super::{PlatformSignal, ROOT_PATH, Router, RoutingMode, path_changed};

/// Router keeping its own linear history with a cursor.
///
/// Push truncates everything past the cursor and appends. Back and forward
/// move the cursor within bounds and report the new path; at either end they
/// do nothing and report nothing.
#[derive(Debug, Clone)]
pub struct HiddenRouter {
    entries: Vec<String>,
    cursor: usize,
}

impl HiddenRouter {
    /// Start at `initial_path`, or the root path.
    pub fn new(initial_path: Option<String>) -> Self {
        Self { entries: vec![initial_path.unwrap_or_else(|| ROOT_PATH.to_string())], cursor: 0 }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Index of the current entry.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn current(&self) -> &str {
        self.entries.get(self.cursor).map_or(ROOT_PATH, String::as_str)
    }
}

impl Router for HiddenRouter {
    fn mode(&self) -> RoutingMode {
        RoutingMode::Hidden
    }

    fn push_state(&mut self, path: &str) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(path.to_string());
        self.cursor = self.entries.len() - 1;
        tracing::debug!(path, depth = self.entries.len(), "hidden push");
    }

    fn back(&mut self) -> Option<ClientMessage> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(path_changed(self.current().to_string()))
    }

    fn forward(&mut self) -> Option<ClientMessage> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(path_changed(self.current().to_string()))
    }

    fn current_path(&self) -> String {
        self.current().to_string()
    }

    fn on_platform_signal(&mut self, _signal: PlatformSignal) -> Option<ClientMessage> {
        None
    }

    fn destroy(&mut self) {}
}
