//! Instrument configuration and driver factory registry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::InstrumentRole;
use crate::error::{InstrumentError, InstrumentResult};
use crate::instrument::{Instrument, InstrumentSettings};

/// Configuration for one instrument instance, as loaded from the runcard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Instance name.
    pub name: String,
    /// Driver name resolved through the [`InstrumentRegistry`].
    pub driver: String,
    /// Network address, if the driver needs one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Roles this instrument plays.
    pub roles: Vec<InstrumentRole>,
    /// Driver-specific settings, forwarded to `setup`.
    #[serde(default)]
    pub settings: InstrumentSettings,
}

impl InstrumentConfig {
    /// Create a config for a named instance of a driver.
    pub fn new(name: impl Into<String>, driver: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            address: None,
            roles: vec![],
            settings: InstrumentSettings::new(),
        }
    }

    /// Set the device address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Add a role.
    #[must_use]
    pub fn with_role(mut self, role: InstrumentRole) -> Self {
        self.roles.push(role);
        self
    }

    /// Add a driver setting.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Whether the instrument has the given role.
    pub fn has_role(&self, role: InstrumentRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Factory function type for instrument drivers.
type DriverFactory =
    Box<dyn Fn(&InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>> + Send + Sync>;

/// Central registry resolving driver names to instrument constructors.
///
/// Backends register themselves once; the platform builds its instrument set
/// purely from configuration.
#[derive(Default)]
pub struct InstrumentRegistry {
    factories: FxHashMap<String, DriverFactory>,
}

impl InstrumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver factory under a name.
    pub fn register_factory(
        &mut self,
        driver: impl Into<String>,
        factory: impl Fn(&InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>>
        + Send
        + Sync
        + 'static,
    ) {
        let driver = driver.into();
        debug!("registering instrument driver: {}", driver);
        self.factories.insert(driver, Box::new(factory));
    }

    /// Instantiate an instrument from its configuration.
    pub fn create(&self, config: &InstrumentConfig) -> InstrumentResult<Box<dyn Instrument>> {
        let factory = self
            .factories
            .get(&config.driver)
            .ok_or_else(|| InstrumentError::UnknownDriver(config.driver.clone()))?;
        factory(config)
    }

    /// Registered driver names.
    pub fn drivers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = InstrumentConfig::new("qrm0", "dummy")
            .with_address("192.168.0.20")
            .with_role(InstrumentRole::Readout)
            .with_setting("sampling_rate", serde_json::json!(1.0e9));
        assert_eq!(config.name, "qrm0");
        assert!(config.has_role(InstrumentRole::Readout));
        assert!(!config.has_role(InstrumentRole::Control));
        assert!(config.settings.contains_key("sampling_rate"));
    }

    #[test]
    fn test_unknown_driver() {
        let registry = InstrumentRegistry::new();
        let config = InstrumentConfig::new("x", "nope");
        let result = registry.create(&config);
        assert!(matches!(result, Err(InstrumentError::UnknownDriver(_))));
    }
}
