//! Client configuration.

use serde::{Deserialize, Serialize};
use treesync_core::{ConnectionConfig, RoutingMode};
use treesync_proto::{Capabilities, ColorScheme};

/// What to do with events sent before the handshake completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPolicy {
    /// Hold them and send them, in order, right after `HelloResponse`.
    #[default]
    Queue,
    /// Drop them.
    Drop,
}

/// Client configuration.
///
/// Everything here is consumed at construction or at handshake time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Identifies this client build to the authority.
    pub client_id: String,
    /// Color scheme detected from the host.
    pub ambient_color_scheme: ColorScheme,
    /// Explicit caller choice. Wins over the detected scheme.
    pub color_scheme_override: Option<ColorScheme>,
    /// Locale detected from the host.
    pub locale: Option<String>,
    /// Routing discipline. `None` lets the transport choose.
    pub routing: Option<RoutingMode>,
    /// Starting path for hidden routing.
    pub initial_path: Option<String>,
    /// Pre-handshake event handling.
    pub event_policy: EventPolicy,
    /// Session state machine settings.
    pub connection: ConnectionConfig,
    /// Advertised features.
    #[serde(with = "treesync_proto::capabilities::bits")]
    pub capabilities: Capabilities,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: concat!("treesync-client/", env!("CARGO_PKG_VERSION")).to_string(),
            ambient_color_scheme: ColorScheme::default(),
            color_scheme_override: None,
            locale: None,
            routing: None,
            initial_path: None,
            event_policy: EventPolicy::default(),
            connection: ConnectionConfig::default(),
            capabilities: Capabilities::standard(),
        }
    }
}

impl ClientConfig {
    /// Set the client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the detected color scheme.
    pub fn with_ambient_color_scheme(mut self, scheme: ColorScheme) -> Self {
        self.ambient_color_scheme = scheme;
        self
    }

    /// Force a color scheme regardless of what the host reports.
    pub fn with_color_scheme_override(mut self, scheme: ColorScheme) -> Self {
        self.color_scheme_override = Some(scheme);
        self
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Pick the routing discipline instead of the transport default.
    pub fn with_routing(mut self, mode: RoutingMode) -> Self {
        self.routing = Some(mode);
        self
    }

    /// Starting path for hidden routing.
    pub fn with_initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = Some(path.into());
        self
    }

    /// Set the pre-handshake event policy.
    pub fn with_event_policy(mut self, policy: EventPolicy) -> Self {
        self.event_policy = policy;
        self
    }

    /// Set session state machine settings.
    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Set advertised capabilities.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Scheme sent in `Hello`.
    pub fn effective_color_scheme(&self) -> ColorScheme {
        self.color_scheme_override.unwrap_or(self.ambient_color_scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_ambient() {
        let config = ClientConfig::default().with_ambient_color_scheme(ColorScheme::Dark);
        assert_eq!(config.effective_color_scheme(), ColorScheme::Dark);

        let config = config.with_color_scheme_override(ColorScheme::Light);
        assert_eq!(config.effective_color_scheme(), ColorScheme::Light);
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.event_policy, EventPolicy::Queue);
        assert_eq!(config.routing, None);
        assert_eq!(config.capabilities, Capabilities::standard());
        assert!(config.client_id.starts_with("treesync-client/"));
    }

    #[test]
    fn builder_sets_fields() {
        let config = ClientConfig::default()
            .with_client_id("playground")
            .with_routing(RoutingMode::Hidden)
            .with_initial_path("/start")
            .with_event_policy(EventPolicy::Drop)
            .with_locale("fr-FR");

        assert_eq!(config.client_id, "playground");
        assert_eq!(config.routing, Some(RoutingMode::Hidden));
        assert_eq!(config.initial_path.as_deref(), Some("/start"));
        assert_eq!(config.event_policy, EventPolicy::Drop);
        assert_eq!(config.locale.as_deref(), Some("fr-FR"));
    }
}
