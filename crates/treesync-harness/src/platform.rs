//! Simulated browser history.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use treesync_core::{HistoryPlatform, ListenerToken, PlatformSignal};

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path component.
    pub path: String,
    /// Fragment, without `#`.
    pub fragment: String,
}

#[derive(Debug, Default)]
struct Browser {
    entries: Vec<Location>,
    index: usize,
    listeners: Vec<(ListenerToken, PlatformSignal)>,
    next_token: u64,
    signals: VecDeque<PlatformSignal>,
    path_pushes: Vec<String>,
    fragment_pushes: Vec<String>,
}

impl Browser {
    fn current(&self) -> Option<&Location> {
        self.entries.get(self.index)
    }

    fn listening(&self, signal: PlatformSignal) -> bool {
        self.listeners.iter().any(|(_, s)| *s == signal)
    }

    fn emit(&mut self, signal: PlatformSignal) {
        if self.listening(signal) {
            self.signals.push_back(signal);
        }
    }

    fn push(&mut self, location: Location) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
    }

    /// Move to another entry the way the back and forward buttons do.
    fn traverse(&mut self, to: usize) {
        if to == self.index || to >= self.entries.len() {
            return;
        }
        let before = self.current().map(|l| l.fragment.clone());
        self.index = to;
        let after = self.current().map(|l| l.fragment.clone());

        self.emit(PlatformSignal::PopState);
        if before != after {
            self.emit(PlatformSignal::HashChange);
        }
    }
}

/// In-memory browser history.
///
/// Behaves like a browser for the events routing cares about:
/// - a path push adds an entry and fires nothing
/// - a fragment push adds an entry and fires `HashChange`
/// - back and forward fire `PopState`, plus `HashChange` when the fragment
///   differs
///
/// Signals queue until [`take_signals`](Self::take_signals) and only for
/// signals somebody is listening to. Clones share the same history.
#[derive(Debug, Clone)]
pub struct SimPlatform {
    browser: Arc<Mutex<Browser>>,
}

impl SimPlatform {
    /// Browser showing `path#fragment`.
    pub fn at(path: &str, fragment: &str) -> Self {
        let browser = Browser {
            entries: vec![Location { path: path.into(), fragment: fragment.into() }],
            ..Browser::default()
        };
        Self { browser: Arc::new(Mutex::new(browser)) }
    }

    fn browser(&self) -> MutexGuard<'_, Browser> {
        self.browser.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current entry.
    pub fn location(&self) -> Location {
        self.browser().current().cloned().unwrap_or_else(|| Location {
            path: "/".into(),
            fragment: String::new(),
        })
    }

    /// Drain queued signals in the order they fired.
    pub fn take_signals(&self) -> Vec<PlatformSignal> {
        self.browser().signals.drain(..).collect()
    }

    /// User presses the back button.
    pub fn user_back(&self) {
        let mut browser = self.browser();
        if let Some(to) = browser.index.checked_sub(1) {
            browser.traverse(to);
        }
    }

    /// User presses the forward button.
    pub fn user_forward(&self) {
        let mut browser = self.browser();
        let to = browser.index + 1;
        browser.traverse(to);
    }

    /// User edits the fragment in the address bar.
    pub fn user_set_fragment(&self, fragment: &str) {
        let mut browser = self.browser();
        let path = browser.current().map(|l| l.path.clone()).unwrap_or_default();
        browser.push(Location { path, fragment: fragment.into() });
        browser.emit(PlatformSignal::HashChange);
    }

    /// Paths pushed through [`HistoryPlatform::push_path`].
    pub fn path_pushes(&self) -> Vec<String> {
        self.browser().path_pushes.clone()
    }

    /// Fragments pushed through [`HistoryPlatform::push_fragment`].
    pub fn fragment_pushes(&self) -> Vec<String> {
        self.browser().fragment_pushes.clone()
    }

    /// Number of history entries.
    pub fn history_len(&self) -> usize {
        self.browser().entries.len()
    }

    /// Registered listeners.
    pub fn listener_count(&self) -> usize {
        self.browser().listeners.len()
    }
}

impl HistoryPlatform for SimPlatform {
    fn path(&self) -> String {
        self.location().path
    }

    fn fragment(&self) -> String {
        self.location().fragment
    }

    fn push_path(&mut self, path: &str) {
        let mut browser = self.browser();
        browser.push(Location { path: path.into(), fragment: String::new() });
        browser.path_pushes.push(path.into());
    }

    fn push_fragment(&mut self, fragment: &str) {
        let mut browser = self.browser();
        let path = browser.current().map(|l| l.path.clone()).unwrap_or_default();
        browser.push(Location { path, fragment: fragment.into() });
        browser.fragment_pushes.push(fragment.into());
        browser.emit(PlatformSignal::HashChange);
    }

    fn back(&mut self) {
        self.user_back();
    }

    fn forward(&mut self) {
        self.user_forward();
    }

    fn listen(&mut self, signal: PlatformSignal) -> ListenerToken {
        let mut browser = self.browser();
        browser.next_token += 1;
        let token = ListenerToken(browser.next_token);
        browser.listeners.push((token, signal));
        token
    }

    fn unlisten(&mut self, token: ListenerToken) {
        self.browser().listeners.retain(|(t, _)| *t != token);
    }
}
