use phsense::{
    apply_update_line, step, ChipInstance, ChipRuntime, PhSensor, SimConfig, Simulation,
    WasmTimeRuntime, OUTPUT_PIN,
};
use std::io::Write;
use tempfile::tempdir;

/// Hand-assembled equivalent of the compiled chip: same pin, attribute,
/// default and period, timer callback reached through the function table.
const PH_SENSOR_WAT: &str = r#"
    (module
        (import "env" "pin_init" (func $pin_init (param i32 i32) (result i32)))
        (import "env" "attr_init_float" (func $attr_init_float (param i32 f32) (result i32)))
        (import "env" "attr_read_float" (func $attr_read_float (param i32) (result f32)))
        (import "env" "timer_init" (func $timer_init (param i32) (result i32)))
        (import "env" "timer_start" (func $timer_start (param i32 i32 i32)))
        (import "env" "pin_dac_write" (func $pin_dac_write (param i32 f32)))
        (memory (export "memory") 1)
        (table (export "__indirect_function_table") 4 funcref)
        (elem (i32.const 3) $chip_timer_event)
        (data (i32.const 16) "AO\00")
        (data (i32.const 32) "voltage\00")
        (func $chip_timer_event (param $chip i32)
            (call $pin_dac_write
                (i32.load (local.get $chip))
                (call $attr_read_float (i32.load offset=4 (local.get $chip)))))
        (func (export "chip_init")
            (i32.store (i32.const 256) (call $pin_init (i32.const 16) (i32.const 4)))
            (i32.store (i32.const 260) (call $attr_init_float (i32.const 32) (f32.const 1.0)))
            (i32.store (i32.const 128) (i32.const 256))
            (i32.store (i32.const 132) (i32.const 3))
            (call $timer_start (call $timer_init (i32.const 128)) (i32.const 1000) (i32.const 1)))
    )
"#;

/// Each entry holds the stdin lines applied before one sampling step.
fn run_script(instance: &mut dyn ChipInstance, tick_us: u64, script: &[&[&str]]) -> Vec<f32> {
    script
        .iter()
        .map(|lines| {
            for line in *lines {
                apply_update_line(instance, line);
            }
            step(instance, tick_us, OUTPUT_PIN).unwrap().voltage
        })
        .collect()
}

#[test]
fn test_native_and_wasm_chips_agree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config_path = dir.path().join("sim.json");
    std::fs::write(&config_path, r#"{"attrs": {"voltage": 7.0}}"#)?;
    let module_path = dir.path().join("ph-sensor.wasm");
    std::fs::File::create(&module_path)?.write_all(&wat::parse_str(PH_SENSOR_WAT)?)?;

    let config = SimConfig::load(&config_path)?;

    let mut native = Simulation::from_config(&config);
    native.load(PhSensor::init);

    let runtime = WasmTimeRuntime::new()?;
    let mut wasm = runtime.load(&std::fs::read(&module_path)?, config.host())?;

    let script: [&[&str]; 8] = [
        &[""],
        &[r#"{"attr":"voltage","value":7.4}"#],
        &[r#"{"attr":"voltage","value":0.0}"#],
        &["not json"],
        &[
            r#"{"attr":"voltage","value":14.0}"#,
            r#"{"attr":"voltage","value":1.0}"#,
        ],
        &[],
        &[],
        &[r#"{"attr":"voltage","value":14.0}"#],
    ];
    let native_out = run_script(&mut native, config.tick_us, &script);
    let wasm_out = run_script(&mut wasm, config.tick_us, &script);

    assert_eq!(native_out, vec![7.0, 7.4, 0.0, 0.0, 1.0, 1.0, 1.0, 14.0]);
    assert_eq!(native_out, wasm_out);
    assert_eq!(wasm.now_us(), native.now_us());
    Ok(())
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = SimConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, phsense::SimError::Io(_)));
}
