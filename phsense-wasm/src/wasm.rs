use crate::{ChipInstance, ChipRuntime, RuntimeError};
use phsense_core::{AttrHandle, ChipHost, PinHandle, PinMode, SimHost, TimerHandle};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use wasmtime::{Caller, Config, Engine, Extern, Instance, Linker, Memory, Module, Store};

/// Import module the chip ABI lives under.
const ENV: &str = "env";
/// Table that timer callbacks (C function pointers) index into.
const CALLBACK_TABLE: &str = "__indirect_function_table";

/// Decoded `timer_config_t`: `{ void *user_data; void (*callback)(void *); }`
/// with wasm32 pointers, so two little-endian `u32`s.
#[derive(Debug, Clone, Copy)]
struct TimerBinding {
    user_data: u32,
    callback: u32,
}

/// Store data: the host the chip talks to plus the callback behind each
/// timer it created.
struct ChipState {
    host: SimHost,
    bindings: HashMap<TimerHandle, TimerBinding>,
}

fn guest_memory(caller: &mut Caller<'_, ChipState>) -> anyhow::Result<Memory> {
    caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or_else(|| RuntimeError::MissingExport("memory".to_string()).into())
}

/// Read a NUL-terminated string out of guest memory.
fn read_c_str(caller: &mut Caller<'_, ChipState>, ptr: u32) -> anyhow::Result<String> {
    let memory = guest_memory(caller)?;
    let data = memory.data(&*caller);
    let tail = data
        .get(ptr as usize..)
        .ok_or(RuntimeError::BadPointer(ptr))?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(RuntimeError::BadPointer(ptr))?;
    Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
}

fn read_timer_config(caller: &mut Caller<'_, ChipState>, ptr: u32) -> anyhow::Result<TimerBinding> {
    let memory = guest_memory(caller)?;
    let mut raw = [0u8; 8];
    memory
        .read(&*caller, ptr as usize, &mut raw)
        .map_err(|_| RuntimeError::BadPointer(ptr))?;
    Ok(TimerBinding {
        user_data: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        callback: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
    })
}

pub struct WasmTimeRuntime {
    engine: Engine,
}

impl WasmTimeRuntime {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::new();
        let engine = Engine::new(&config)?;
        Ok(Self { engine })
    }

    fn linker(&self) -> anyhow::Result<Linker<ChipState>> {
        let mut linker = Linker::new(&self.engine);

        linker.func_wrap(
            ENV,
            "pin_init",
            |mut caller: Caller<'_, ChipState>, name: u32, mode: u32| -> anyhow::Result<u32> {
                let name = read_c_str(&mut caller, name)?;
                let mode = PinMode::from_raw(mode).unwrap_or_else(|| {
                    warn!(pin = %name, mode, "unknown pin mode, using input");
                    PinMode::Input
                });
                Ok(caller.data_mut().host.pin_init(&name, mode).0)
            },
        )?;
        linker.func_wrap(
            ENV,
            "pin_dac_write",
            |mut caller: Caller<'_, ChipState>, pin: u32, voltage: f32| {
                caller.data_mut().host.pin_dac_write(PinHandle(pin), voltage);
            },
        )?;
        linker.func_wrap(
            ENV,
            "pin_adc_read",
            |caller: Caller<'_, ChipState>, pin: u32| -> f32 {
                caller.data().host.pin_adc_read(PinHandle(pin))
            },
        )?;
        linker.func_wrap(
            ENV,
            "attr_init",
            |mut caller: Caller<'_, ChipState>, name: u32, default: u32| -> anyhow::Result<u32> {
                let name = read_c_str(&mut caller, name)?;
                Ok(caller.data_mut().host.attr_init(&name, default).0)
            },
        )?;
        linker.func_wrap(
            ENV,
            "attr_init_float",
            |mut caller: Caller<'_, ChipState>, name: u32, default: f32| -> anyhow::Result<u32> {
                let name = read_c_str(&mut caller, name)?;
                Ok(caller.data_mut().host.attr_init_float(&name, default).0)
            },
        )?;
        linker.func_wrap(
            ENV,
            "attr_read",
            |caller: Caller<'_, ChipState>, attr: u32| -> u32 {
                caller.data().host.attr_read(AttrHandle(attr))
            },
        )?;
        linker.func_wrap(
            ENV,
            "attr_read_float",
            |caller: Caller<'_, ChipState>, attr: u32| -> f32 {
                caller.data().host.attr_read_float(AttrHandle(attr))
            },
        )?;
        linker.func_wrap(
            ENV,
            "timer_init",
            |mut caller: Caller<'_, ChipState>, config: u32| -> anyhow::Result<u32> {
                let binding = read_timer_config(&mut caller, config)?;
                let state = caller.data_mut();
                let timer = state.host.timer_init();
                state.bindings.insert(timer, binding);
                debug!(%timer, callback = binding.callback, "timer bound");
                Ok(timer.0)
            },
        )?;
        linker.func_wrap(
            ENV,
            "timer_start",
            |mut caller: Caller<'_, ChipState>, timer: u32, micros: u32, repeat: i32| {
                caller
                    .data_mut()
                    .host
                    .timer_start(TimerHandle(timer), micros, repeat != 0);
            },
        )?;
        linker.func_wrap(
            ENV,
            "timer_start_ns",
            |mut caller: Caller<'_, ChipState>, timer: u32, nanos: u64, repeat: i32| {
                caller
                    .data_mut()
                    .host
                    .timer_start_ns(TimerHandle(timer), nanos, repeat != 0);
            },
        )?;
        linker.func_wrap(
            ENV,
            "timer_stop",
            |mut caller: Caller<'_, ChipState>, timer: u32| {
                caller.data_mut().host.timer_stop(TimerHandle(timer));
            },
        )?;
        linker.func_wrap(
            ENV,
            "get_sim_nanos",
            |caller: Caller<'_, ChipState>| -> u64 { caller.data().host.sim_nanos() },
        )?;

        Ok(linker)
    }
}

impl ChipRuntime for WasmTimeRuntime {
    type Instance = WasmChip;

    fn name(&self) -> &str {
        "wasmtime"
    }

    fn load(&self, payload: &[u8], host: SimHost) -> Result<WasmChip, RuntimeError> {
        // 1. Compile Module
        let module =
            Module::new(&self.engine, payload).map_err(|e| RuntimeError::Wasm(e.to_string()))?;

        // 2. Link the chip ABI; anything else the toolchain pulled in (WASI) traps if called
        let mut linker = self.linker().map_err(RuntimeError::from_trap)?;
        linker
            .define_unknown_imports_as_traps(&module)
            .map_err(RuntimeError::from_trap)?;

        // 3. Instantiate
        let mut store = Store::new(
            &self.engine,
            ChipState {
                host,
                bindings: HashMap::new(),
            },
        );
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(RuntimeError::from_trap)?;

        // 4. Reactor constructors and API version are optional
        if let Ok(initialize) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
            initialize
                .call(&mut store, ())
                .map_err(RuntimeError::from_trap)?;
        }
        if let Ok(version) = instance.get_typed_func::<(), u32>(&mut store, "__wokwi_api_version_1")
        {
            let api_version = version
                .call(&mut store, ())
                .map_err(RuntimeError::from_trap)?;
            info!(api_version, "chip reports API version");
        }

        // 5. Invoke "chip_init" export
        let chip_init = instance
            .get_typed_func::<(), ()>(&mut store, "chip_init")
            .map_err(|_| RuntimeError::MissingExport("chip_init".to_string()))?;
        chip_init
            .call(&mut store, ())
            .map_err(RuntimeError::from_trap)?;

        let state = store.data();
        info!(
            pins = state.host.pin_count(),
            attrs = state.host.attr_count(),
            timers = state.bindings.len(),
            "wasm chip loaded"
        );
        Ok(WasmChip { store, instance })
    }
}

/// A chip instantiated inside a wasmtime store.
pub struct WasmChip {
    store: Store<ChipState>,
    instance: Instance,
}

impl WasmChip {
    pub fn pin_voltage(&self, name: &str) -> Option<f32> {
        self.store.data().host.pin_voltage(name)
    }

    pub fn set_attr(&mut self, name: &str, value: f32) {
        self.store.data_mut().host.set_attr(name, value);
    }

    pub fn now_us(&self) -> u64 {
        self.store.data().host.now_us()
    }

    /// Call the C callback behind `timer` with its `user_data`.
    fn fire(&mut self, timer: TimerHandle) -> Result<(), RuntimeError> {
        let binding = *self
            .store
            .data()
            .bindings
            .get(&timer)
            .ok_or(RuntimeError::UnknownTimer(timer))?;

        let table = self
            .instance
            .get_table(&mut self.store, CALLBACK_TABLE)
            .ok_or_else(|| RuntimeError::MissingExport(CALLBACK_TABLE.to_string()))?;
        let callback = table
            .get(&mut self.store, u64::from(binding.callback))
            .and_then(|slot| slot.as_func().flatten().cloned())
            .ok_or_else(|| {
                RuntimeError::Wasm(format!(
                    "table slot {} holds no function for {timer}",
                    binding.callback
                ))
            })?;
        let callback = callback
            .typed::<u32, ()>(&self.store)
            .map_err(RuntimeError::from_trap)?;
        callback
            .call(&mut self.store, binding.user_data)
            .map_err(RuntimeError::from_trap)
    }
}

impl ChipInstance for WasmChip {
    fn run_for(&mut self, micros: u64) -> Result<(), RuntimeError> {
        let deadline = self
            .store
            .data()
            .host
            .now_ns()
            .saturating_add(micros.saturating_mul(1_000));
        while let Some(due) = self.store.data_mut().host.poll_due(deadline) {
            self.fire(due.handle)?;
        }
        self.store.data_mut().host.advance_to(deadline);
        Ok(())
    }

    fn host(&self) -> &SimHost {
        &self.store.data().host
    }

    fn host_mut(&mut self) -> &mut SimHost {
        &mut self.store.data_mut().host
    }
}
