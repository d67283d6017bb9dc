//! The pH sensor as a loadable simulator chip.
//!
//! On `wasm32` this crate exports `chip_init` and a timer trampoline over
//! the simulator's C ABI. Elsewhere only [`ChipSlot`] is compiled, which is
//! what the exports drive and what the tests exercise.

use phsense_core::{ChipHost, PhSensor};

/// State block handed to the simulator as timer `user_data`.
#[derive(Debug, Default)]
pub struct ChipSlot {
    sensor: Option<PhSensor>,
}

impl ChipSlot {
    pub fn init(&mut self, host: &mut dyn ChipHost) {
        self.sensor = Some(PhSensor::init(host));
    }

    pub fn tick(&self, host: &mut dyn ChipHost) {
        if let Some(sensor) = &self.sensor {
            sensor.on_tick(host);
        }
    }

    pub fn sensor(&self) -> Option<&PhSensor> {
        self.sensor.as_ref()
    }
}

#[cfg(target_arch = "wasm32")]
mod ffi {
    use super::ChipSlot;
    use core::ffi::{c_char, c_void};
    use phsense_core::{AttrHandle, ChipHost, PinHandle, PinMode, TimerHandle};
    use std::ffi::CString;

    #[repr(C)]
    struct TimerConfig {
        user_data: *mut c_void,
        callback: extern "C" fn(*mut c_void),
    }

    #[link(wasm_import_module = "env")]
    extern "C" {
        fn pin_init(name: *const c_char, mode: u32) -> u32;
        fn pin_dac_write(pin: u32, voltage: f32);
        fn pin_adc_read(pin: u32) -> f32;
        fn attr_init(name: *const c_char, default_value: u32) -> u32;
        fn attr_init_float(name: *const c_char, default_value: f32) -> u32;
        fn attr_read(attr: u32) -> u32;
        fn attr_read_float(attr: u32) -> f32;
        fn timer_init(config: *const TimerConfig) -> u32;
        fn timer_start(timer: u32, micros: u32, repeat: bool);
        fn timer_start_ns(timer: u32, nanos: u64, repeat: bool);
        fn timer_stop(timer: u32);
        fn get_sim_nanos() -> u64;
    }

    /// Forwards every host call to the simulator imports. Timers it creates
    /// call back into `chip_timer_event` with `user_data`.
    struct SimulatorHost {
        user_data: *mut c_void,
    }

    fn c_name(name: &str) -> CString {
        CString::new(name).unwrap_or_default()
    }

    // SAFETY: every import takes plain integers or floats, except the
    // name pointers (NUL-terminated `CString`s alive for the call) and the
    // timer config, which the simulator copies before returning.
    impl ChipHost for SimulatorHost {
        fn pin_init(&mut self, name: &str, mode: PinMode) -> PinHandle {
            let name = c_name(name);
            PinHandle(unsafe { pin_init(name.as_ptr(), mode.raw()) })
        }

        fn pin_dac_write(&mut self, pin: PinHandle, voltage: f32) {
            unsafe { pin_dac_write(pin.0, voltage) }
        }

        fn pin_adc_read(&self, pin: PinHandle) -> f32 {
            unsafe { pin_adc_read(pin.0) }
        }

        fn attr_init_float(&mut self, name: &str, default: f32) -> AttrHandle {
            let name = c_name(name);
            AttrHandle(unsafe { attr_init_float(name.as_ptr(), default) })
        }

        fn attr_read_float(&self, attr: AttrHandle) -> f32 {
            unsafe { attr_read_float(attr.0) }
        }

        fn attr_init(&mut self, name: &str, default: u32) -> AttrHandle {
            let name = c_name(name);
            AttrHandle(unsafe { attr_init(name.as_ptr(), default) })
        }

        fn attr_read(&self, attr: AttrHandle) -> u32 {
            unsafe { attr_read(attr.0) }
        }

        fn timer_init(&mut self) -> TimerHandle {
            let config = TimerConfig {
                user_data: self.user_data,
                callback: chip_timer_event,
            };
            TimerHandle(unsafe { timer_init(&config) })
        }

        fn timer_start(&mut self, timer: TimerHandle, micros: u32, repeat: bool) {
            unsafe { timer_start(timer.0, micros, repeat) }
        }

        fn timer_start_ns(&mut self, timer: TimerHandle, nanos: u64, repeat: bool) {
            unsafe { timer_start_ns(timer.0, nanos, repeat) }
        }

        fn timer_stop(&mut self, timer: TimerHandle) {
            unsafe { timer_stop(timer.0) }
        }

        fn sim_nanos(&self) -> u64 {
            unsafe { get_sim_nanos() }
        }
    }

    #[no_mangle]
    pub extern "C" fn __wokwi_api_version_1() -> u32 {
        1
    }

    #[no_mangle]
    pub extern "C" fn chip_init() {
        // Lives until the simulator tears the whole module down.
        let slot = Box::into_raw(Box::new(ChipSlot::default()));
        let mut host = SimulatorHost {
            user_data: slot.cast(),
        };
        // SAFETY: slot came from Box::into_raw above and is never freed.
        unsafe { (*slot).init(&mut host) };
    }

    extern "C" fn chip_timer_event(user_data: *mut c_void) {
        // SAFETY: user_data is the slot leaked in chip_init.
        let slot = unsafe { &*(user_data as *const ChipSlot) };
        let mut host = SimulatorHost { user_data };
        slot.tick(&mut host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phsense_core::{SimHost, OUTPUT_PIN, VOLTAGE_ATTR};

    #[test]
    fn test_empty_slot_tick_is_a_no_op() {
        let mut host = SimHost::new();
        ChipSlot::default().tick(&mut host);
        assert_eq!(host.pin_count(), 0);
    }

    #[test]
    fn test_slot_drives_sensor() {
        let mut host = SimHost::new();
        let mut slot = ChipSlot::default();
        slot.init(&mut host);
        assert!(slot.sensor().is_some());

        host.set_attr(VOLTAGE_ATTR, 6.5);
        slot.tick(&mut host);
        assert_eq!(host.pin_voltage(OUTPUT_PIN), Some(6.5));
    }
}
