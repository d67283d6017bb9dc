//! Run the pH sensor chip against the reference host and print samples.
//!
//! The chip runs natively by default, or from a compiled module with
//! `--wasm`. Each tick prints one JSON line on stdout; logs go to stderr.
//!
//! Usage:
//!   cargo run --bin phsense-sim -- [--config sim.json] [--ticks 10]
//!   cargo run --bin phsense-sim -- --wasm target/wasm32-unknown-unknown/release/phsense_chip.wasm
//!   cargo run --bin phsense-sim -- --stdin   # one tick per line, e.g. {"attr":"voltage","value":7.4}

use phsense::{
    apply_update_line, step, ChipInstance, ChipRuntime, PhSensor, SimConfig, Simulation,
    WasmTimeRuntime, OUTPUT_PIN,
};
use std::io::{BufRead, Write};
use tracing::info;

const DEFAULT_TICKS: u64 = 10;

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let use_stdin = args.iter().any(|a| a == "--stdin");
    let ticks = match arg_value(&args, "--ticks") {
        Some(n) => n.parse::<u64>()?,
        None => DEFAULT_TICKS,
    };
    let config = match arg_value(&args, "--config") {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut instance: Box<dyn ChipInstance> = match arg_value(&args, "--wasm") {
        Some(path) => {
            let payload = std::fs::read(&path)?;
            let runtime = WasmTimeRuntime::new()?;
            info!(path = %path, runtime = runtime.name(), "loading chip module");
            Box::new(runtime.load(&payload, config.host())?)
        }
        None => {
            let mut sim = Simulation::from_config(&config);
            sim.load(PhSensor::init);
            Box::new(sim)
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if use_stdin {
        info!("Reading attribute updates from stdin, one tick per line.");
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            apply_update_line(instance.as_mut(), &line);
            let sample = step(instance.as_mut(), config.tick_us, OUTPUT_PIN)?;
            writeln!(out, "{}", serde_json::to_string(&sample)?)?;
        }
    } else {
        for _ in 0..ticks {
            let sample = step(instance.as_mut(), config.tick_us, OUTPUT_PIN)?;
            writeln!(out, "{}", serde_json::to_string(&sample)?)?;
        }
    }

    Ok(())
}
