use crate::{AttrUpdate, Sample, SimError};
use phsense_wasm::ChipInstance;
use tracing::{info, warn};

/// Apply one JSON line of the form `{"attr":"voltage","value":7.4}`.
///
/// Blank lines are ignored; malformed ones are logged and skipped. Returns
/// the update that was applied, if any.
pub fn apply_update_line(instance: &mut dyn ChipInstance, line: &str) -> Option<AttrUpdate> {
    let s = line.trim();
    if s.is_empty() {
        return None;
    }
    match serde_json::from_str::<AttrUpdate>(s) {
        Ok(update) => {
            instance.host_mut().set_attr(&update.attr, update.value);
            info!(attr = %update.attr, value = update.value, "attribute update");
            Some(update)
        }
        Err(e) => {
            warn!(error = %e, line = s, "ignoring malformed update");
            None
        }
    }
}

/// Run one sampling period and read `pin` afterwards.
pub fn step(instance: &mut dyn ChipInstance, tick_us: u64, pin: &str) -> Result<Sample, SimError> {
    instance.run_for(tick_us)?;
    Sample::capture(instance, pin)
}
