use phsense::{AttrUpdate, Sample, SimConfig};
use serde_json::json;

#[test]
fn test_sample_schema_lock() {
    // Downstream tooling parses these lines. Renaming a field breaks it.
    let sample = Sample {
        time_us: 3000,
        pin: "AO".to_string(),
        voltage: 7.5,
    };
    let value = serde_json::to_value(&sample).expect("Schema break: Sample");
    assert_eq!(
        value,
        json!({
            "time_us": 3000,
            "pin": "AO",
            "voltage": 7.5
        })
    );
}

#[test]
fn test_attr_update_schema_lock() {
    let legacy_json = json!({
        "attr": "voltage",
        "value": 7.4
    });

    let update: AttrUpdate =
        serde_json::from_value(legacy_json).expect("Schema break: AttrUpdate");
    assert_eq!(update.attr, "voltage");
    assert!((update.value - 7.4).abs() < f32::EPSILON);
}

#[test]
fn test_sim_config_schema_lock() {
    let legacy_json = json!({
        "attrs": { "voltage": 14.0 },
        "tick_us": 500
    });

    let config: SimConfig = serde_json::from_value(legacy_json).expect("Schema break: SimConfig");
    assert_eq!(config.attrs.get("voltage"), Some(&14.0));
    assert_eq!(config.tick_us, 500);
}

#[test]
fn test_sim_config_fields_are_optional() {
    let config: SimConfig = serde_json::from_value(json!({ "tick_us": 250 })).unwrap();
    assert!(config.attrs.is_empty());
    assert_eq!(config.tick_us, 250);
}
