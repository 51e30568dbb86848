//! Measured data payloads, one shape per test kind.

use hq_core::TestKind;
use serde::{Deserialize, Serialize};

/// Type-specific measured data of a test instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestData {
    Airflow(AirflowData),
    PressureDifference(PressureData),
    FlowDirection(FlowDirectionData),
    HepaLeakage(HepaLeakageData),
    ParticleCount(ParticleCountData),
    RecoveryTime(RecoveryTimeData),
    TemperatureHumidity(TemperatureHumidityData),
    Noise(NoiseData),
}

impl TestData {
    pub fn kind(&self) -> TestKind {
        match self {
            TestData::Airflow(_) => TestKind::Airflow,
            TestData::PressureDifference(_) => TestKind::PressureDifference,
            TestData::FlowDirection(_) => TestKind::FlowDirection,
            TestData::HepaLeakage(_) => TestKind::HepaLeakage,
            TestData::ParticleCount(_) => TestKind::ParticleCount,
            TestData::RecoveryTime(_) => TestKind::RecoveryTime,
            TestData::TemperatureHumidity(_) => TestKind::TemperatureHumidity,
            TestData::Noise(_) => TestKind::Noise,
        }
    }
}

/// Supply airflow at one terminal (filter outlet or duct).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirflowData {
    #[serde(default)]
    pub point: String,
    /// Mean face velocity over the filter.
    #[serde(default)]
    pub air_speed_mps: f64,
    #[serde(default)]
    pub filter_width_m: f64,
    #[serde(default)]
    pub filter_length_m: f64,
    /// Measured flow per filter unit. When absent it is derived from speed and face area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate_m3h: Option<f64>,
    #[serde(default = "default_filter_units")]
    pub filter_units: u32,
}

fn default_filter_units() -> u32 {
    1
}

/// Differential pressure against one adjacent reference area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressureData {
    pub reference_area: String,
    pub pressure_pa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirDirection {
    /// From the tested room towards the reference area.
    Outward,
    /// From the reference area into the tested room.
    Inward,
}

impl AirDirection {
    pub fn label(self) -> &'static str {
        match self {
            AirDirection::Outward => "outward",
            AirDirection::Inward => "inward",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowDirectionData {
    pub reference_area: String,
    pub expected: AirDirection,
    pub observed: AirDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HepaLeakageData {
    #[serde(default)]
    pub filter: String,
    pub leakage_percent: f64,
}

/// One particle size channel of a sampling location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParticleChannel {
    pub size_um: f64,
    pub count_per_m3: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticleCountData {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub channels: Vec<ParticleChannel>,
    /// Overrides the room-class target for this sampling location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_iso_class: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryTimeData {
    pub recovery_minutes: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureHumidityData {
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoiseData {
    pub level_dba: f64,
}
