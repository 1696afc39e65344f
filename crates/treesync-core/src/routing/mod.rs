//! Routing and history management.
//!
//! Three disciplines for representing where the user is, chosen once per
//! client and fixed for its lifetime:
//!
//! - [`RoutingMode::History`]: the platform's real path, native history stack
//! - [`RoutingMode::Fragment`]: the platform's URL fragment, native history stack
//! - [`RoutingMode::Hidden`]: no visible address; the router keeps its own list
//!
//! Each discipline is its own [`Router`] implementation, and each owns the
//! lifecycle of the platform listeners it registers. Routers never send
//! anything themselves: an out-of-band location change comes back as a
//! `PathChanged` message for the client to put on its send path.

mod fragment;
mod hidden;
mod history;

pub use fragment::FragmentRouter;
pub use hidden::HiddenRouter;
pub use history::HistoryRouter;
use serde::{Deserialize, Serialize};
use treesync_proto::ClientMessage;

use crate::error::RoutingError;

/// Path used when nothing else is known.
pub const ROOT_PATH: &str = "/";

/// Addressing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Platform path plus native history.
    History,
    /// Platform URL fragment plus native history.
    Fragment,
    /// Internal history list, nothing visible.
    Hidden,
}

/// Change notifications a platform can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformSignal {
    /// The history entry changed (back/forward button).
    PopState,
    /// The URL fragment changed.
    HashChange,
}

/// Token for a registered platform listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Host address bar and history stack.
///
/// Implemented by the embedding. Listener registration only records interest:
/// the host delivers the signal later through
/// [`Router::on_platform_signal`].
pub trait HistoryPlatform: Send {
    /// Current location path.
    fn path(&self) -> String;

    /// Current URL fragment, without the leading `#`.
    fn fragment(&self) -> String;

    /// Push a new history entry with this path.
    fn push_path(&mut self, path: &str);

    /// Push a new history entry with this fragment.
    fn push_fragment(&mut self, fragment: &str);

    /// Native back.
    fn back(&mut self);

    /// Native forward.
    fn forward(&mut self);

    /// Register interest in a signal.
    fn listen(&mut self, signal: PlatformSignal) -> ListenerToken;

    /// Release a registration.
    fn unlisten(&mut self, token: ListenerToken);
}

/// Navigation contract shared by all routing disciplines.
pub trait Router: Send {
    /// Discipline implemented.
    fn mode(&self) -> RoutingMode;

    /// Navigate forward to `path`. Initiated by the authority, so nothing is
    /// reported back.
    fn push_state(&mut self, path: &str);

    /// Step back. Returns the message to send if the location changed
    /// synchronously.
    fn back(&mut self) -> Option<ClientMessage>;

    /// Step forward. Returns the message to send if the location changed
    /// synchronously.
    fn forward(&mut self) -> Option<ClientMessage>;

    /// Current path.
    fn current_path(&self) -> String;

    /// Deliver a platform signal. Returns the message to send if it reflects
    /// an out-of-band location change.
    fn on_platform_signal(&mut self, signal: PlatformSignal) -> Option<ClientMessage>;

    /// Release platform listeners. Idempotent.
    fn destroy(&mut self);
}

/// Build the router for a mode.
///
/// `initial_path` only applies to hidden mode; the other modes read the
/// platform.
///
/// # Errors
///
/// Returns `PlatformRequired` for history or fragment mode without a platform
pub fn build(
    mode: RoutingMode,
    platform: Option<Box<dyn HistoryPlatform>>,
    initial_path: Option<String>,
) -> Result<Box<dyn Router>, RoutingError> {
    match (mode, platform) {
        (RoutingMode::History, Some(platform)) => Ok(Box::new(HistoryRouter::new(platform))),
        (RoutingMode::Fragment, Some(platform)) => Ok(Box::new(FragmentRouter::new(platform))),
        (RoutingMode::Hidden, _) => Ok(Box::new(HiddenRouter::new(initial_path))),
        (mode, None) => Err(RoutingError::PlatformRequired(mode)),
    }
}

fn path_changed(path: String) -> ClientMessage {
    ClientMessage::PathChanged { path }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Minimal in-memory platform for router unit tests.

    use std::sync::{Arc, Mutex};

    use super::{HistoryPlatform, ListenerToken, PlatformSignal};

    #[derive(Debug, Default)]
    pub(crate) struct Log {
        pub(crate) entries: Vec<(String, String)>,
        pub(crate) index: usize,
        pub(crate) path_pushes: Vec<String>,
        pub(crate) fragment_pushes: Vec<String>,
        pub(crate) backs: usize,
        pub(crate) forwards: usize,
        pub(crate) listeners: Vec<(ListenerToken, PlatformSignal)>,
        next_token: u64,
    }

    #[derive(Debug, Clone)]
    pub(crate) struct FakePlatform(pub(crate) Arc<Mutex<Log>>);

    impl FakePlatform {
        pub(crate) fn at(path: &str, fragment: &str) -> Self {
            let log = Log { entries: vec![(path.into(), fragment.into())], ..Log::default() };
            Self(Arc::new(Mutex::new(log)))
        }

        pub(crate) fn log(&self) -> std::sync::MutexGuard<'_, Log> {
            self.0.lock().unwrap()
        }
    }

    impl HistoryPlatform for FakePlatform {
        fn path(&self) -> String {
            let log = self.log();
            log.entries[log.index].0.clone()
        }

        fn fragment(&self) -> String {
            let log = self.log();
            log.entries[log.index].1.clone()
        }

        fn push_path(&mut self, path: &str) {
            let mut log = self.log();
            let index = log.index;
            log.entries.truncate(index + 1);
            log.entries.push((path.into(), String::new()));
            log.index += 1;
            log.path_pushes.push(path.into());
        }

        fn push_fragment(&mut self, fragment: &str) {
            let mut log = self.log();
            let index = log.index;
            let path = log.entries[index].0.clone();
            log.entries.truncate(index + 1);
            log.entries.push((path, fragment.into()));
            log.index += 1;
            log.fragment_pushes.push(fragment.into());
        }

        fn back(&mut self) {
            let mut log = self.log();
            log.backs += 1;
            log.index = log.index.saturating_sub(1);
        }

        fn forward(&mut self) {
            let mut log = self.log();
            log.forwards += 1;
            if log.index + 1 < log.entries.len() {
                log.index += 1;
            }
        }

        fn listen(&mut self, signal: PlatformSignal) -> ListenerToken {
            let mut log = self.log();
            log.next_token += 1;
            let token = ListenerToken(log.next_token);
            log.listeners.push((token, signal));
            token
        }

        fn unlisten(&mut self, token: ListenerToken) {
            self.log().listeners.retain(|(t, _)| *t != token);
        }
    }
}
