//! Native simulation driver.
//!
//! A [`Simulation`] owns a [`SimHost`] and the chips loaded into it. Virtual
//! time only moves when the caller asks it to; every timer that comes due
//! on the way is handed to the chip that created it, one at a time, in time
//! order.

use crate::{SimConfig, SimError};
use phsense_core::{Chip, ChipHost, SimHost, TICK_US};
use phsense_wasm::{ChipInstance, RuntimeError};
use tracing::{debug, info, warn};

/// Index of a chip inside a [`Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChipId(pub usize);

#[derive(Default)]
pub struct Simulation {
    host: SimHost,
    chips: Vec<Box<dyn Chip>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            host: config.host(),
            chips: Vec::new(),
        }
    }

    /// Run a chip's initializer against the host and keep the chip.
    ///
    /// Timers created by `init` belong to the new chip.
    pub fn load<C, F>(&mut self, init: F) -> ChipId
    where
        C: Chip + 'static,
        F: FnOnce(&mut dyn ChipHost) -> C,
    {
        let id = self.chips.len();
        let previous = self.host.set_owner(Some(id));
        let chip = init(&mut self.host);
        self.host.set_owner(previous);

        info!(chip = chip.name(), id, "chip loaded");
        self.chips.push(Box::new(chip));
        ChipId(id)
    }

    /// Advance virtual time by `micros`, dispatching due timers.
    pub fn advance(&mut self, micros: u64) {
        let deadline = self
            .host
            .now_ns()
            .saturating_add(micros.saturating_mul(1_000));

        while let Some(due) = self.host.poll_due(deadline) {
            let Some(chip) = due.owner.and_then(|owner| self.chips.get_mut(owner)) else {
                warn!(timer = %due.handle, "timer has no owning chip");
                continue;
            };
            debug!(timer = %due.handle, at_ns = due.at_ns, chip = chip.name(), "timer fired");
            let previous = self.host.set_owner(due.owner);
            chip.on_timer(due.handle, &mut self.host);
            self.host.set_owner(previous);
        }
        self.host.advance_to(deadline);
    }

    /// Advance by one sensor period.
    pub fn tick(&mut self) {
        self.advance(u64::from(TICK_US));
    }

    pub fn set_attr(&mut self, name: &str, value: f32) {
        self.host.set_attr(name, value);
    }

    pub fn pin_voltage(&self, name: &str) -> Result<f32, SimError> {
        self.host
            .pin_voltage(name)
            .ok_or_else(|| SimError::UnknownPin(name.to_string()))
    }

    pub fn attr_value(&self, name: &str) -> Result<f32, SimError> {
        self.host
            .attr_value(name)
            .ok_or_else(|| SimError::UnknownAttr(name.to_string()))
    }

    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    pub fn now_us(&self) -> u64 {
        self.host.now_us()
    }
}

impl ChipInstance for Simulation {
    fn run_for(&mut self, micros: u64) -> Result<(), RuntimeError> {
        self.advance(micros);
        Ok(())
    }

    fn host(&self) -> &SimHost {
        &self.host
    }

    fn host_mut(&mut self) -> &mut SimHost {
        &mut self.host
    }
}
