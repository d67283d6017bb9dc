pub mod config;
pub mod error;
pub mod protocol;
pub mod runner;
pub mod sim;

pub use config::{SimConfig, MAX_TICK_US};
pub use error::SimError;
pub use phsense_core::{
    AttrHandle, Chip, ChipHost, PhSensor, PinHandle, PinMode, SimHost, TimerHandle,
    DEFAULT_VOLTAGE, OUTPUT_PIN, TICK_US, VOLTAGE_ATTR,
};
pub use phsense_wasm::{ChipInstance, ChipRuntime, RuntimeError, WasmChip, WasmTimeRuntime};
pub use protocol::{AttrUpdate, Sample};
pub use runner::{apply_update_line, step};
pub use sim::{ChipId, Simulation};
