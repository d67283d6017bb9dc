use phsense::{apply_update_line, PhSensor, Simulation, OUTPUT_PIN, VOLTAGE_ATTR};
use proptest::prelude::*;

fn sensor() -> Simulation {
    let mut sim = Simulation::new();
    sim.load(PhSensor::init);
    sim
}

proptest! {
    #[test]
    fn test_tick_is_pure_passthrough(v in -1000.0f32..1000.0f32) {
        let mut sim = sensor();
        sim.set_attr(VOLTAGE_ATTR, v);
        sim.tick();
        prop_assert_eq!(sim.pin_voltage(OUTPUT_PIN).unwrap(), v);
    }

    #[test]
    fn test_repeated_ticks_are_idempotent(v in 0.0f32..14.0f32, ticks in 1usize..20) {
        let mut sim = sensor();
        sim.set_attr(VOLTAGE_ATTR, v);
        for _ in 0..ticks {
            sim.tick();
            prop_assert_eq!(sim.pin_voltage(OUTPUT_PIN).unwrap(), v);
        }
    }

    #[test]
    fn test_output_tracks_last_value_per_tick(
        // Each inner vec is the sequence of values set between two ticks.
        schedule in prop::collection::vec(
            prop::collection::vec(0.0f32..14.0f32, 1..4),
            1..20
        )
    ) {
        let mut sim = sensor();
        for values in schedule {
            for v in &values {
                sim.set_attr(VOLTAGE_ATTR, *v);
            }
            sim.tick();
            prop_assert_eq!(sim.pin_voltage(OUTPUT_PIN).unwrap(), *values.last().unwrap());
        }
    }

    #[test]
    fn test_arbitrary_update_lines_never_panic(line in "\\PC*") {
        let mut sim = sensor();
        let _ = apply_update_line(&mut sim, &line);
        sim.tick();
        prop_assert!(sim.pin_voltage(OUTPUT_PIN).is_ok());
    }
}
