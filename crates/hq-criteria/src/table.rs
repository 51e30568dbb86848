//! Acceptance thresholds per room class, loaded from YAML.
//!
//! ```yaml
//! aggregation: all_must_pass
//! class_ib:
//!   min_air_change_rate_per_h: 20.0
//!   min_pressure_pa: 6.0
//!   ...
//! ```

use std::path::Path;

use hq_core::{RoomClass, TestMode, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::iso::{ISO_MAX_CLASS, ISO_MIN_CLASS};
use crate::{CriteriaError, CriteriaResult};

/// How instances of the same test kind combine into a room verdict.
///
/// Pressure readings always combine with AND, whatever the policy says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    #[default]
    AllMustPass,
    AnyMustPass,
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v.is_finite() && v >= self.min && v <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomClassCriteria {
    pub min_air_change_rate_per_h: f64,
    pub min_pressure_pa: f64,
    pub max_hepa_leakage_percent: f64,
    pub iso_class_at_rest: f64,
    pub iso_class_in_operation: f64,
    pub max_recovery_minutes: f64,
    pub temperature_c: Range,
    pub humidity_percent: Range,
    pub max_noise_dba: f64,
}

impl RoomClassCriteria {
    pub fn iso_class(&self, mode: TestMode) -> f64 {
        match mode {
            TestMode::AtRest => self.iso_class_at_rest,
            TestMode::InOperation => self.iso_class_in_operation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaTable {
    #[serde(default)]
    pub aggregation: AggregationPolicy,
    pub class_ib: RoomClassCriteria,
    pub class_ii: RoomClassCriteria,
    pub intensive_care: RoomClassCriteria,
    pub other: RoomClassCriteria,
}

impl Default for CriteriaTable {
    fn default() -> Self {
        Self {
            aggregation: AggregationPolicy::AllMustPass,
            class_ib: RoomClassCriteria {
                min_air_change_rate_per_h: 20.0,
                min_pressure_pa: 6.0,
                max_hepa_leakage_percent: 0.01,
                iso_class_at_rest: 5.0,
                iso_class_in_operation: 7.0,
                max_recovery_minutes: 15.0,
                temperature_c: Range::new(20.0, 24.0),
                humidity_percent: Range::new(40.0, 60.0),
                max_noise_dba: 48.0,
            },
            class_ii: RoomClassCriteria {
                min_air_change_rate_per_h: 15.0,
                min_pressure_pa: 6.0,
                max_hepa_leakage_percent: 0.01,
                iso_class_at_rest: 7.0,
                iso_class_in_operation: 8.0,
                max_recovery_minutes: 15.0,
                temperature_c: Range::new(20.0, 24.0),
                humidity_percent: Range::new(40.0, 60.0),
                max_noise_dba: 45.0,
            },
            intensive_care: RoomClassCriteria {
                min_air_change_rate_per_h: 12.0,
                min_pressure_pa: 6.0,
                max_hepa_leakage_percent: 0.01,
                iso_class_at_rest: 7.0,
                iso_class_in_operation: 8.0,
                max_recovery_minutes: 15.0,
                temperature_c: Range::new(20.0, 24.0),
                humidity_percent: Range::new(40.0, 60.0),
                max_noise_dba: 40.0,
            },
            other: RoomClassCriteria {
                min_air_change_rate_per_h: 6.0,
                min_pressure_pa: 2.5,
                max_hepa_leakage_percent: 0.01,
                iso_class_at_rest: 8.0,
                iso_class_in_operation: 9.0,
                max_recovery_minutes: 20.0,
                temperature_c: Range::new(20.0, 26.0),
                humidity_percent: Range::new(30.0, 60.0),
                max_noise_dba: 50.0,
            },
        }
    }
}

impl CriteriaTable {
    pub fn for_class(&self, class: RoomClass) -> &RoomClassCriteria {
        match class {
            RoomClass::ClassIb => &self.class_ib,
            RoomClass::ClassIi => &self.class_ii,
            RoomClass::IntensiveCare => &self.intensive_care,
            RoomClass::Other => &self.other,
        }
    }

    pub fn for_class_mut(&mut self, class: RoomClass) -> &mut RoomClassCriteria {
        match class {
            RoomClass::ClassIb => &mut self.class_ib,
            RoomClass::ClassIi => &mut self.class_ii,
            RoomClass::IntensiveCare => &mut self.intensive_care,
            RoomClass::Other => &mut self.other,
        }
    }

    pub fn from_yaml_str(content: &str) -> CriteriaResult<Self> {
        let table: CriteriaTable = serde_yaml::from_str(content)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load_yaml(path: &Path) -> CriteriaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> CriteriaResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> CriteriaResult<()> {
        for class in RoomClass::ALL {
            let c = self.for_class(class);
            let ctx = class.to_string();
            check_non_negative(&ctx, "min_air_change_rate_per_h", c.min_air_change_rate_per_h)?;
            check_non_negative(&ctx, "min_pressure_pa", c.min_pressure_pa)?;
            check_non_negative(&ctx, "max_hepa_leakage_percent", c.max_hepa_leakage_percent)?;
            check_iso_class(&ctx, "iso_class_at_rest", c.iso_class_at_rest)?;
            check_iso_class(&ctx, "iso_class_in_operation", c.iso_class_in_operation)?;
            check_non_negative(&ctx, "max_recovery_minutes", c.max_recovery_minutes)?;
            check_range(&ctx, "temperature_c", c.temperature_c)?;
            check_range(&ctx, "humidity_percent", c.humidity_percent)?;
            check_non_negative(&ctx, "max_noise_dba", c.max_noise_dba)?;
        }
        Ok(())
    }
}

fn invalid(class: &str, field: &str, value: String, reason: String) -> CriteriaError {
    CriteriaError::InvalidValue {
        field: format!("{class}.{field}"),
        value,
        reason,
    }
}

fn finite(class: &str, field: &'static str, value: f64) -> CriteriaResult<f64> {
    ensure_finite(value, field).map_err(|e| invalid(class, field, value.to_string(), e.to_string()))
}

fn check_non_negative(class: &str, field: &'static str, value: f64) -> CriteriaResult<()> {
    if finite(class, field, value)? < 0.0 {
        return Err(invalid(
            class,
            field,
            value.to_string(),
            "must be non-negative".to_string(),
        ));
    }
    Ok(())
}

fn check_iso_class(class: &str, field: &'static str, value: f64) -> CriteriaResult<()> {
    if !(ISO_MIN_CLASS..=ISO_MAX_CLASS).contains(&finite(class, field, value)?) {
        return Err(invalid(
            class,
            field,
            value.to_string(),
            "must be an ISO class in [1, 9]".to_string(),
        ));
    }
    Ok(())
}

fn check_range(class: &str, field: &'static str, range: Range) -> CriteriaResult<()> {
    let min = finite(class, field, range.min)?;
    let max = finite(class, field, range.max)?;
    if min > max {
        return Err(invalid(
            class,
            field,
            format!("[{min}, {max}]"),
            "min must not exceed max".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CriteriaTable::default().validate().unwrap();
    }

    #[test]
    fn yaml_round_trip() {
        let table = CriteriaTable::default();
        let yaml = table.to_yaml_string().unwrap();
        let loaded = CriteriaTable::from_yaml_str(&yaml).unwrap();
        assert_eq!(table, loaded);
    }

    #[test]
    fn aggregation_defaults_when_omitted() {
        let mut yaml = CriteriaTable::default().to_yaml_string().unwrap();
        yaml = yaml
            .lines()
            .filter(|l| !l.starts_with("aggregation"))
            .collect::<Vec<_>>()
            .join("\n");
        let loaded = CriteriaTable::from_yaml_str(&yaml).unwrap();
        assert_eq!(loaded.aggregation, AggregationPolicy::AllMustPass);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut table = CriteriaTable::default();
        table.intensive_care.humidity_percent = Range::new(60.0, 40.0);
        let yaml = table.to_yaml_string().unwrap();
        let err = CriteriaTable::from_yaml_str(&yaml).unwrap_err();
        assert!(format!("{err}").contains("intensive_care.humidity_percent"));
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let mut table = CriteriaTable::default();
        table.class_ii.max_noise_dba = f64::NAN;
        let err = table.validate().unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("class_ii.max_noise_dba"));
        assert!(msg.contains("Non-finite"));

        let mut table = CriteriaTable::default();
        table.other.temperature_c = Range::new(f64::NEG_INFINITY, 24.0);
        assert!(table.validate().is_err());
    }

    #[test]
    fn range_is_two_sided() {
        let r = Range::new(20.0, 24.0);
        assert!(r.contains(20.0));
        assert!(r.contains(24.0));
        assert!(!r.contains(19.9));
        assert!(!r.contains(24.1));
        assert!(!r.contains(f64::NAN));
    }
}
