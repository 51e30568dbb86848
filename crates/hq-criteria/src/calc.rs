//! Derived-value calculations.
//!
//! Unit convention: flow rates in m³/h, volumes in m³, so the air-change rate
//! `total_flow_rate / volume` comes out directly in air changes per hour.

use core::fmt;

use hq_core::{as_m3, as_m3ph, m, m2, mps, non_negative};
use serde::{Deserialize, Serialize};

use crate::measure::AirflowData;

/// Room volume at full precision; negative or non-finite inputs count as 0.
pub fn room_volume(surface_area_m2: f64, height_m: f64) -> f64 {
    as_m3(m2(non_negative(surface_area_m2)) * m(non_negative(height_m)))
}

/// Air changes per hour, or `Undefined` when the room has no volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AirChangeRate {
    Defined(f64),
    Undefined,
}

impl AirChangeRate {
    pub fn value(self) -> Option<f64> {
        match self {
            AirChangeRate::Defined(v) => Some(v),
            AirChangeRate::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, AirChangeRate::Defined(_))
    }
}

impl fmt::Display for AirChangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirChangeRate::Defined(v) => write!(f, "{v:.2} 1/h"),
            AirChangeRate::Undefined => f.write_str("undefined (room volume is 0)"),
        }
    }
}

pub fn air_change_rate(total_flow_rate_m3h: f64, volume_m3: f64) -> AirChangeRate {
    if !volume_m3.is_finite() || volume_m3 <= 0.0 {
        return AirChangeRate::Undefined;
    }
    AirChangeRate::Defined(non_negative(total_flow_rate_m3h) / volume_m3)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirflowDerived {
    pub flow_rate_m3h: f64,
    pub total_flow_rate_m3h: f64,
    pub air_change_rate: AirChangeRate,
}

/// Flow through one filter unit: the measured value when present, else face velocity × face area.
pub fn unit_flow_rate(data: &AirflowData) -> f64 {
    match data.flow_rate_m3h {
        Some(q) => non_negative(q),
        None => {
            let face = m(non_negative(data.filter_width_m)) * m(non_negative(data.filter_length_m));
            as_m3ph(mps(non_negative(data.air_speed_mps)) * face)
        }
    }
}

pub fn derive_airflow(data: &AirflowData, room_volume_m3: f64) -> AirflowDerived {
    let flow_rate_m3h = unit_flow_rate(data);
    let total_flow_rate_m3h = flow_rate_m3h * f64::from(data.filter_units.max(1));
    AirflowDerived {
        flow_rate_m3h,
        total_flow_rate_m3h,
        air_change_rate: air_change_rate(total_flow_rate_m3h, room_volume_m3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hq_core::{Tolerances, nearly_equal};

    fn airflow(flow: Option<f64>, units: u32) -> AirflowData {
        AirflowData {
            point: "F1".to_string(),
            air_speed_mps: 0.5,
            filter_width_m: 0.6,
            filter_length_m: 0.6,
            flow_rate_m3h: flow,
            filter_units: units,
        }
    }

    #[test]
    fn volume_clamps_negative_inputs() {
        assert_eq!(room_volume(20.0, 3.0), 60.0);
        assert_eq!(room_volume(-20.0, 3.0), 0.0);
        assert_eq!(room_volume(20.0, f64::NAN), 0.0);
    }

    #[test]
    fn zero_volume_is_undefined_not_infinite() {
        let ach = air_change_rate(1944.0, 0.0);
        assert_eq!(ach, AirChangeRate::Undefined);
        assert!(ach.value().is_none());
        assert_eq!(air_change_rate(1944.0, -1.0), AirChangeRate::Undefined);
    }

    #[test]
    fn measured_flow_multiplied_by_units() {
        let d = derive_airflow(&airflow(Some(972.0), 2), 60.0);
        assert_eq!(d.flow_rate_m3h, 972.0);
        assert_eq!(d.total_flow_rate_m3h, 1944.0);
        assert_eq!(d.air_change_rate, AirChangeRate::Defined(32.4));
    }

    #[test]
    fn flow_from_face_velocity() {
        // 0.5 m/s over 0.36 m² = 0.18 m³/s = 648 m³/h
        let d = derive_airflow(&airflow(None, 1), 60.0);
        assert!(nearly_equal(d.flow_rate_m3h, 648.0, Tolerances::default()));
        let ach = d.air_change_rate.value().unwrap();
        assert!(nearly_equal(ach, 10.8, Tolerances::default()));
    }

    #[test]
    fn zero_units_counts_as_one() {
        let d = derive_airflow(&airflow(Some(500.0), 0), 50.0);
        assert_eq!(d.total_flow_rate_m3h, 500.0);
    }
}
