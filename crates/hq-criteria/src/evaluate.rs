//! Pass/fail evaluation of one test instance.

use hq_core::{FlowType, RoomClass, TestMode};
use serde::{Deserialize, Serialize};

use crate::calc::{AirChangeRate, AirflowDerived, derive_airflow};
use crate::iso::implied_iso_class;
use crate::measure::TestData;
use crate::table::CriteriaTable;

/// The room facts an evaluation depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomContext {
    pub room_class: RoomClass,
    pub test_mode: TestMode,
    pub flow_type: FlowType,
    pub volume_m3: f64,
}

/// Values computed from a payload while evaluating it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Derived {
    #[default]
    None,
    Airflow(AirflowDerived),
    ParticleCount { implied_iso_class: Option<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub meets_criteria: bool,
    pub criteria: String,
    #[serde(default)]
    pub derived: Derived,
}

impl TestOutcome {
    fn plain(meets_criteria: bool, criteria: String) -> Self {
        Self {
            meets_criteria,
            criteria,
            derived: Derived::None,
        }
    }
}

/// Evaluate one payload against the thresholds of its room class.
pub fn evaluate(data: &TestData, room: &RoomContext, table: &CriteriaTable) -> TestOutcome {
    let limits = table.for_class(room.room_class);
    let class = room.room_class.label();

    match data {
        TestData::Airflow(a) => {
            let derived = derive_airflow(a, room.volume_m3);
            let min = limits.min_air_change_rate_per_h;
            let (meets_criteria, criteria) = match derived.air_change_rate {
                AirChangeRate::Defined(ach) => (
                    ach >= min,
                    format!("Air change rate >= {min:.1} 1/h ({class})"),
                ),
                AirChangeRate::Undefined => (
                    false,
                    format!(
                        "Air change rate >= {min:.1} 1/h ({class}); undefined because room volume is 0"
                    ),
                ),
            };
            TestOutcome {
                meets_criteria,
                criteria,
                derived: Derived::Airflow(derived),
            }
        }
        TestData::PressureDifference(p) => {
            let min = limits.min_pressure_pa;
            TestOutcome::plain(
                p.pressure_pa.is_finite() && p.pressure_pa >= min,
                format!(
                    "Pressure difference to {} >= {min:.1} Pa ({class})",
                    p.reference_area
                ),
            )
        }
        TestData::FlowDirection(d) => TestOutcome::plain(
            d.observed == d.expected,
            format!(
                "Air must flow {} relative to {}",
                d.expected.label(),
                d.reference_area
            ),
        ),
        TestData::HepaLeakage(h) => {
            let max = limits.max_hepa_leakage_percent;
            TestOutcome::plain(
                h.leakage_percent.is_finite() && h.leakage_percent <= max,
                format!("Filter leakage <= {max}% ({class})"),
            )
        }
        TestData::ParticleCount(p) => {
            let target = p
                .target_iso_class
                .unwrap_or_else(|| limits.iso_class(room.test_mode));
            let implied = implied_iso_class(&p.channels);
            let meets_criteria = implied.is_some_and(|n| n <= target + 1e-9);
            TestOutcome {
                meets_criteria,
                criteria: format!(
                    "ISO class {target:.1} or cleaner ({}, {})",
                    room.test_mode.label(),
                    class
                ),
                derived: Derived::ParticleCount {
                    implied_iso_class: implied,
                },
            }
        }
        TestData::RecoveryTime(r) => {
            let max = limits.max_recovery_minutes;
            TestOutcome::plain(
                r.recovery_minutes.is_finite()
                    && r.recovery_minutes >= 0.0
                    && r.recovery_minutes <= max,
                format!("Recovery time <= {max:.0} min ({class})"),
            )
        }
        TestData::TemperatureHumidity(th) => {
            let t = limits.temperature_c;
            let h = limits.humidity_percent;
            TestOutcome::plain(
                t.contains(th.temperature_c) && h.contains(th.humidity_percent),
                format!(
                    "Temperature {:.1}-{:.1} C and humidity {:.0}-{:.0}% ({class})",
                    t.min, t.max, h.min, h.max
                ),
            )
        }
        TestData::Noise(n) => {
            let max = limits.max_noise_dba;
            TestOutcome::plain(
                n.level_dba.is_finite() && n.level_dba <= max,
                format!("Noise level <= {max:.0} dB(A) ({class})"),
            )
        }
    }
}
