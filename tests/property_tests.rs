//! Property tests for the presence engine's timing and threshold invariants.

use bed_presence::engine::{
    Classification, DebounceConfig, EngineSettings, HysteresisConfig, PresenceEngine,
    PresenceState, Sample,
};
use proptest::prelude::*;

const MU: f64 = 6.7;
const SIGMA: f64 = 3.5;

fn engine_with(debounce: DebounceConfig) -> PresenceEngine {
    let mut engine = PresenceEngine::with_defaults();
    engine.set_debounce(debounce);
    engine
}

fn value_for_z(z: f64) -> f64 {
    MU + z * SIGMA
}

/// Drives a default engine into OCCUPIED and returns the commit time.
fn occupy(engine: &mut PresenceEngine) -> u64 {
    let occupied_ms = engine.settings().debounce().debounce_occupied_ms;
    engine.apply_sample(Sample {
        value: 25.0,
        observed_at: 0,
    });
    engine.apply_sample(Sample {
        value: 25.0,
        observed_at: occupied_ms,
    });
    assert_eq!(engine.state(), PresenceState::Occupied);
    occupied_ms
}

proptest! {
    /// Any accepted multiplier pair keeps the on-threshold above the off-threshold.
    #[test]
    fn accepted_hysteresis_orders_thresholds(
        k_on in -10.0f64..10.0,
        k_off in -10.0f64..10.0,
        mu in 0.0f64..100.0,
        sigma in 0.001f64..50.0,
    ) {
        let mut settings = EngineSettings::default();
        prop_assume!(settings.set_baseline(mu, sigma).is_ok());

        match HysteresisConfig::new(k_on, k_off) {
            Ok(_) => {
                settings.set_hysteresis(k_on, k_off).expect("validated above");
                prop_assert!(k_on > k_off);
                prop_assert!(settings.on_threshold() > settings.off_threshold());
            }
            Err(_) => {
                prop_assert!(k_on <= k_off);
                prop_assert!(settings.set_hysteresis(k_on, k_off).is_err());
                prop_assert_eq!(settings.hysteresis(), HysteresisConfig::default());
            }
        }
    }

    /// A z inside the hysteresis gap never flips VACANT and OCCUPIED directly.
    #[test]
    fn gap_values_never_flip_stable_states(
        zs in proptest::collection::vec(2.01f64..3.99, 1..60),
        step_ms in 1u64..2000,
    ) {
        let mut vacant = PresenceEngine::with_defaults();
        let mut occupied = PresenceEngine::with_defaults();
        let start = occupy(&mut occupied);

        for (i, z) in zs.iter().enumerate() {
            let t = start + (i as u64 + 1) * step_ms;
            let value = value_for_z(*z);

            let decision = vacant.apply_sample(Sample { value, observed_at: t });
            prop_assert_eq!(decision.classification, Classification::Between);
            prop_assert_eq!(decision.state, PresenceState::Vacant);

            let before = occupied.state();
            let decision = occupied.apply_sample(Sample { value, observed_at: t });
            if decision.state == PresenceState::Vacant && before != PresenceState::Vacant {
                prop_assert_eq!(before, PresenceState::Occupied);
                prop_assert_eq!(decision.reason.as_str(), "failsafe timeout");
            }
        }
    }

    /// Without reinforcement, OCCUPIED is left no later than abs_clear_delay_ms.
    #[test]
    fn watchdog_bounds_unreinforced_occupancy(
        zs in proptest::collection::vec(-3.0f64..3.99, 1..200),
        step_ms in 100u64..3000,
        abs_clear_delay_ms in 1_000u64..60_000,
        debounce_vacant_ms in 0u64..120_000,
    ) {
        let mut engine = engine_with(DebounceConfig {
            debounce_occupied_ms: 3000,
            debounce_vacant_ms,
            abs_clear_delay_ms,
        });
        let reinforced = occupy(&mut engine);

        for (i, z) in zs.iter().enumerate() {
            let t = reinforced + (i as u64 + 1) * step_ms;
            let decision = engine.apply_sample(Sample { value: value_for_z(*z), observed_at: t });
            prop_assert_ne!(decision.classification, Classification::AboveOn);
            if t - reinforced >= abs_clear_delay_ms {
                prop_assert!(!decision.occupied);
            }
            if !decision.occupied {
                break;
            }
        }
    }

    /// Steady ABOVE_ON commits at the first tick at or past the debounce, never earlier.
    #[test]
    fn occupied_commits_exactly_when_debounce_elapses(
        debounce_occupied_ms in 0u64..10_000,
        step_ms in 1u64..1500,
    ) {
        let mut engine = engine_with(DebounceConfig {
            debounce_occupied_ms,
            debounce_vacant_ms: 5000,
            abs_clear_delay_ms: 30_000,
        });

        let mut t = 0;
        loop {
            let decision = engine.apply_sample(Sample { value: 25.0, observed_at: t });
            if t >= debounce_occupied_ms {
                prop_assert!(decision.occupied);
                break;
            }
            prop_assert!(!decision.occupied);
            t += step_ms;
        }
    }
}
