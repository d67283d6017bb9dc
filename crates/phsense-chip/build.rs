fn main() {
    // Timer callbacks are function-table indices, so the table must be visible to the simulator.
    if std::env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("wasm32") {
        println!("cargo:rustc-link-arg-cdylib=--export-table");
    }
}
