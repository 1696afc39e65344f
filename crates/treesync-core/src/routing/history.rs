//! Full-history routing: the platform path is the address.

use treesync_proto::ClientMessage;

use super::{
    HistoryPlatform, ListenerToken, PlatformSignal, ROOT_PATH, Router, RoutingMode, path_changed,
};

/// Router backed by the platform path and native history stack.
///
/// Back and forward delegate to the platform. The resulting location change
/// arrives as a `PopState` signal and is reported to the authority then.
pub struct HistoryRouter {
    platform: Box<dyn HistoryPlatform>,
    listener: Option<ListenerToken>,
}

impl HistoryRouter {
    /// Create the router and start listening for `PopState`.
    pub fn new(mut platform: Box<dyn HistoryPlatform>) -> Self {
        let listener = Some(platform.listen(PlatformSignal::PopState));
        Self { platform, listener }
    }
}

impl Router for HistoryRouter {
    fn mode(&self) -> RoutingMode {
        RoutingMode::History
    }

    fn push_state(&mut self, path: &str) {
        tracing::debug!(path, "history push");
        self.platform.push_path(path);
    }

    fn back(&mut self) -> Option<ClientMessage> {
        self.platform.back();
        None
    }

    fn forward(&mut self) -> Option<ClientMessage> {
        self.platform.forward();
        None
    }

    fn current_path(&self) -> String {
        let path = self.platform.path();
        if path.is_empty() { ROOT_PATH.to_string() } else { path }
    }

    fn on_platform_signal(&mut self, signal: PlatformSignal) -> Option<ClientMessage> {
        if self.listener.is_none() || signal != PlatformSignal::PopState {
            return None;
        }
        Some(path_changed(self.current_path()))
    }

    fn destroy(&mut self) {
        if let Some(token) = self.listener.take() {
            self.platform.unlisten(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::testing::FakePlatform;

    #[test]
    fn push_calls_native_push_once() {
        let platform = FakePlatform::at("/", "");
        let mut router = HistoryRouter::new(Box::new(platform.clone()));

        router.push_state("/a");

        assert_eq!(platform.log().path_pushes, vec!["/a".to_string()]);
        assert_eq!(router.current_path(), "/a");
    }

    #[test]
    fn back_is_reported_via_popstate() {
        let platform = FakePlatform::at("/", "");
        let mut router = HistoryRouter::new(Box::new(platform.clone()));
        router.push_state("/a");

        assert_eq!(router.back(), None);
        assert_eq!(platform.log().backs, 1);

        let msg = router.on_platform_signal(PlatformSignal::PopState);
        assert_eq!(msg, Some(ClientMessage::PathChanged { path: "/".into() }));
    }

    #[test]
    fn hash_change_is_not_ours() {
        let platform = FakePlatform::at("/", "");
        let mut router = HistoryRouter::new(Box::new(platform));
        assert_eq!(router.on_platform_signal(PlatformSignal::HashChange), None);
    }

    #[test]
    fn destroy_releases_listener_once() {
        let platform = FakePlatform::at("/", "");
        let mut router = HistoryRouter::new(Box::new(platform.clone()));
        assert_eq!(platform.log().listeners.len(), 1);

        router.destroy();
        router.destroy();

        assert!(platform.log().listeners.is_empty());
        assert_eq!(router.on_platform_signal(PlatformSignal::PopState), None);
    }
}
