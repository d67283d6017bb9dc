use crate::SimError;
use phsense_wasm::ChipInstance;
use serde::{Deserialize, Serialize};

/// One observation of an output pin, printed as a JSON line per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time_us: u64,
    pub pin: String,
    pub voltage: f32,
}

impl Sample {
    pub fn capture(instance: &dyn ChipInstance, pin: &str) -> Result<Self, SimError> {
        let host = instance.host();
        let voltage = host
            .pin_voltage(pin)
            .ok_or_else(|| SimError::UnknownPin(pin.to_string()))?;
        Ok(Self {
            time_us: host.now_us(),
            pin: pin.to_string(),
            voltage,
        })
    }
}

/// Attribute change fed to the simulator between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrUpdate {
    pub attr: String,
    pub value: f32,
}
