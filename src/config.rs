use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::catalog::{DEFAULT_CONTAINER_ID, find_container};
use crate::layering::{LayerStrategy, LayeringConfig};
use crate::types::{BOX_ORDER_TOLERANCE, DEFAULT_GRID_PITCH, LAYER_THRESHOLD};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            planner: PlannerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value = env_string("STOWAGE_PLANNER_API_HOST")
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Could not parse STOWAGE_PLANNER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("STOWAGE_PLANNER_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            tracing::warn!(
                "⚠️ STOWAGE_PLANNER_API_PORT must not be 0. Using {}.",
                ApiConfig::DEFAULT_PORT
            );
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse STOWAGE_PLANNER_API_PORT ('{}'): {}. Using {}.",
                raw,
                err,
                ApiConfig::DEFAULT_PORT
            );
            None
        }
    }
}

/// Tunables of the placement and layering engine.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Pitch of the placement grid in meters
    pub grid_pitch: f64,
    /// Snap incoming placement positions before validating them
    pub snap_placements: bool,
    pub layering: LayeringConfig,
    /// Container type used when a request names none
    pub default_container_id: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            grid_pitch: DEFAULT_GRID_PITCH,
            snap_placements: true,
            layering: LayeringConfig::default(),
            default_container_id: DEFAULT_CONTAINER_ID.to_string(),
        }
    }
}

impl PlannerConfig {
    const GRID_PITCH_VAR: &'static str = "STOWAGE_PLANNER_GRID_PITCH";
    const SNAP_PLACEMENTS_VAR: &'static str = "STOWAGE_PLANNER_SNAP_PLACEMENTS";
    const LAYER_THRESHOLD_VAR: &'static str = "STOWAGE_PLANNER_LAYER_THRESHOLD";
    const BOX_ORDER_TOLERANCE_VAR: &'static str = "STOWAGE_PLANNER_BOX_ORDER_TOLERANCE";
    const LAYER_STRATEGY_VAR: &'static str = "STOWAGE_PLANNER_LAYER_STRATEGY";
    const DEFAULT_CONTAINER_VAR: &'static str = "STOWAGE_PLANNER_DEFAULT_CONTAINER";

    /// Creates a builder for custom configuration.
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }

    fn from_env() -> Self {
        let grid_pitch = load_f64_with_warning(
            Self::GRID_PITCH_VAR,
            DEFAULT_GRID_PITCH,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted grid pitch changes where dragged items land",
        );

        let threshold = load_f64_with_warning(
            Self::LAYER_THRESHOLD_VAR,
            LAYER_THRESHOLD,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted layer threshold changes layer numbering",
        );

        let box_order_tolerance = load_f64_with_warning(
            Self::BOX_ORDER_TOLERANCE_VAR,
            BOX_ORDER_TOLERANCE,
            |value| value >= 0.0,
            "must not be negative",
            "Adjusted box order tolerance changes box numbering",
        );

        let strategy = env_string(Self::LAYER_STRATEGY_VAR)
            .and_then(|raw| parse_strategy(&raw, Self::LAYER_STRATEGY_VAR))
            .unwrap_or_default();

        let snap_placements = env_string(Self::SNAP_PLACEMENTS_VAR)
            .and_then(|raw| parse_bool(&raw, Self::SNAP_PLACEMENTS_VAR))
            .unwrap_or(true);

        let default_container_id = env_string(Self::DEFAULT_CONTAINER_VAR)
            .and_then(|raw| parse_container_id(&raw, Self::DEFAULT_CONTAINER_VAR))
            .unwrap_or_else(|| DEFAULT_CONTAINER_ID.to_string());

        Self::builder()
            .grid_pitch(grid_pitch)
            .snap_placements(snap_placements)
            .layer_threshold(threshold)
            .box_order_tolerance(box_order_tolerance)
            .layer_strategy(strategy)
            .default_container_id(default_container_id)
            .build()
    }
}

/// Builder for PlannerConfig.
#[derive(Clone, Debug, Default)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    pub fn grid_pitch(mut self, pitch: f64) -> Self {
        self.config.grid_pitch = pitch;
        self
    }

    pub fn snap_placements(mut self, enabled: bool) -> Self {
        self.config.snap_placements = enabled;
        self
    }

    pub fn layer_threshold(mut self, threshold: f64) -> Self {
        self.config.layering.threshold = threshold;
        self
    }

    pub fn box_order_tolerance(mut self, tolerance: f64) -> Self {
        self.config.layering.box_order_tolerance = tolerance;
        self
    }

    pub fn layer_strategy(mut self, strategy: LayerStrategy) -> Self {
        self.config.layering.strategy = strategy;
        self
    }

    pub fn default_container_id(mut self, id: impl Into<String>) -> Self {
        self.config.default_container_id = id.into();
        self
    }

    pub fn build(self) -> PlannerConfig {
        self.config
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            tracing::warn!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name,
                err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            tracing::warn!(
                "⚠️ Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn parse_strategy(raw: &str, var_name: &str) -> Option<LayerStrategy> {
    let strategy = LayerStrategy::parse(raw);
    if strategy.is_none() {
        tracing::warn!(
            "⚠️ Unknown layer strategy in {} ('{}'). \
             Expected first_encounter or sorted_linkage.",
            var_name,
            raw
        );
    }
    strategy
}

fn parse_container_id(raw: &str, var_name: &str) -> Option<String> {
    match find_container(raw) {
        Some(container) => Some(container.id),
        None => {
            tracing::warn!(
                "⚠️ {} names unknown container type '{}'. Using {}.",
                var_name,
                raw,
                DEFAULT_CONTAINER_ID
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => {
            parse_f64_with_warning(&raw, var_name, default, validator, invalid_hint, warning)
        }
        None => default,
    }
}

fn parse_f64_with_warning(
    raw: &str,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = (default.abs().max(1.0)) * 1e-9;
            if (value - default).abs() > tolerance {
                tracing::info!("⚠️ {} ({} = {}).", warning, var_name, value);
            }
            value
        }
        Ok(_) => {
            tracing::warn!(
                "⚠️ {} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            default
        }
        Err(err) => {
            tracing::warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_true_values() {
        assert_eq!(parse_bool("1", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("true", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("yes", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool("on", "TEST_VAR"), Some(true));

        // Test case insensitivity
        assert_eq!(parse_bool("TRUE", "TEST_VAR"), Some(true));
        assert_eq!(parse_bool(" Yes ", "TEST_VAR"), Some(true));
    }

    #[test]
    fn test_parse_bool_false_values() {
        assert_eq!(parse_bool("0", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("false", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("no", "TEST_VAR"), Some(false));
        assert_eq!(parse_bool("OFF", "TEST_VAR"), Some(false));
    }

    #[test]
    fn test_parse_bool_invalid_values() {
        assert_eq!(parse_bool("invalid", "TEST_VAR"), None);
        assert_eq!(parse_bool("2", "TEST_VAR"), None);
        assert_eq!(parse_bool("", "TEST_VAR"), None);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("9000"), Some(9000));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port("http"), None);
    }

    #[test]
    fn test_parse_f64_falls_back_on_invalid_values() {
        let positive = |value: f64| value > 0.0;
        assert_eq!(parse_f64_with_warning("0.25", "V", 0.1, positive, "", ""), 0.25);
        assert_eq!(parse_f64_with_warning("-1", "V", 0.1, positive, "", ""), 0.1);
        assert_eq!(parse_f64_with_warning("NaN", "V", 0.1, positive, "", ""), 0.1);
        assert_eq!(parse_f64_with_warning("abc", "V", 0.1, positive, "", ""), 0.1);
    }

    #[test]
    fn test_parse_strategy_and_container() {
        assert_eq!(
            parse_strategy("sorted_linkage", "V"),
            Some(LayerStrategy::SortedLinkage)
        );
        assert_eq!(parse_strategy("bogus", "V"), None);
        assert_eq!(parse_container_id("40fthc", "V").as_deref(), Some("40ftHC"));
        assert_eq!(parse_container_id("45ft", "V"), None);
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = PlannerConfig::builder()
            .grid_pitch(0.05)
            .snap_placements(false)
            .layer_threshold(0.02)
            .layer_strategy(LayerStrategy::SortedLinkage)
            .default_container_id("40ft")
            .build();

        assert_eq!(config.grid_pitch, 0.05);
        assert!(!config.snap_placements);
        assert_eq!(config.layering.threshold, 0.02);
        assert_eq!(config.layering.box_order_tolerance, BOX_ORDER_TOLERANCE);
        assert_eq!(config.layering.strategy, LayerStrategy::SortedLinkage);
        assert_eq!(config.default_container_id, "40ft");

        let defaults = PlannerConfig::default();
        assert_eq!(defaults.grid_pitch, DEFAULT_GRID_PITCH);
        assert!(defaults.snap_placements);
        assert_eq!(defaults.default_container_id, DEFAULT_CONTAINER_ID);
    }
}
