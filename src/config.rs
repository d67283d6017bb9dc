use crate::SimError;
use phsense_core::{SimHost, TICK_US};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Longest sampling interval accepted: one minute of virtual time.
pub const MAX_TICK_US: u64 = 60_000_000;

/// Simulation settings, read from a JSON file.
///
/// ```json
/// { "attrs": { "voltage": 7.4 }, "tick_us": 1000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Attribute values applied before any chip registers them.
    pub attrs: BTreeMap<String, f32>,
    /// Interval between samples, in microseconds.
    pub tick_us: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            attrs: BTreeMap::new(),
            tick_us: u64::from(TICK_US),
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| SimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.tick_us == 0 {
            return Err(SimError::Config("tick_us must be positive".to_string()));
        }
        if self.tick_us > MAX_TICK_US {
            return Err(SimError::Config(format!(
                "tick_us {} exceeds {MAX_TICK_US}",
                self.tick_us
            )));
        }
        if let Some((name, _)) = self.attrs.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::Config(format!("attribute {name} is not finite")));
        }
        Ok(())
    }

    /// A fresh host carrying this config's attribute presets.
    pub fn host(&self) -> SimHost {
        let mut host = SimHost::new();
        for (name, value) in &self.attrs {
            host.set_attr(name, *value);
        }
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.tick_us, 1000);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let err = SimConfig::from_json(r#"{"tick_us": 0}"#).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_oversized_tick_rejected() {
        let json = format!(r#"{{"tick_us": {}}}"#, MAX_TICK_US + 1);
        let err = SimConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));

        let err = SimConfig::from_json(r#"{"tick_us": 18446744073709551615}"#).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));

        let json = format!(r#"{{"tick_us": {MAX_TICK_US}}}"#);
        assert_eq!(SimConfig::from_json(&json).unwrap().tick_us, MAX_TICK_US);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = SimConfig::from_json(r#"{"attrs": {"voltage": "high"}}"#).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_host_carries_presets() {
        let config = SimConfig::from_json(r#"{"attrs": {"voltage": 7.4}}"#).unwrap();
        let mut host = config.host();
        let attr = phsense_core::ChipHost::attr_init_float(&mut host, "voltage", 1.0);
        assert_eq!(phsense_core::ChipHost::attr_read_float(&host, attr), 7.4);
    }
}
