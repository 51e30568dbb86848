//! Fixed vocabularies shared by every layer.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::HqError;

/// Occupancy state during measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    #[default]
    AtRest,
    InOperation,
}

/// Air distribution pattern of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    #[default]
    Turbulent,
    Laminar,
    Unidirectional,
}

/// Hospital room classification; selects which thresholds apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomClass {
    ClassIb,
    ClassIi,
    IntensiveCare,
    #[default]
    Other,
}

/// Test type tag of a test instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Airflow,
    PressureDifference,
    FlowDirection,
    HepaLeakage,
    ParticleCount,
    RecoveryTime,
    TemperatureHumidity,
    Noise,
}

/// Kind of generated artifact; keys the file index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Excel,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 2] = [DocumentFormat::Pdf, DocumentFormat::Excel];

    pub fn label(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Excel => "Excel",
        }
    }

    /// File extension of the artifact; Excel output is CSV.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Excel => "csv",
        }
    }

    fn key(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Excel => "excel",
        }
    }
}

impl TestMode {
    pub const ALL: [TestMode; 2] = [TestMode::AtRest, TestMode::InOperation];

    pub fn label(self) -> &'static str {
        match self {
            TestMode::AtRest => "At rest",
            TestMode::InOperation => "In operation",
        }
    }

    fn key(self) -> &'static str {
        match self {
            TestMode::AtRest => "at_rest",
            TestMode::InOperation => "in_operation",
        }
    }
}

impl FlowType {
    pub const ALL: [FlowType; 3] = [FlowType::Turbulent, FlowType::Laminar, FlowType::Unidirectional];

    pub fn label(self) -> &'static str {
        match self {
            FlowType::Turbulent => "Turbulent",
            FlowType::Laminar => "Laminar",
            FlowType::Unidirectional => "Unidirectional",
        }
    }

    fn key(self) -> &'static str {
        match self {
            FlowType::Turbulent => "turbulent",
            FlowType::Laminar => "laminar",
            FlowType::Unidirectional => "unidirectional",
        }
    }
}

impl RoomClass {
    pub const ALL: [RoomClass; 4] = [
        RoomClass::ClassIb,
        RoomClass::ClassIi,
        RoomClass::IntensiveCare,
        RoomClass::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RoomClass::ClassIb => "Class IB",
            RoomClass::ClassIi => "Class II",
            RoomClass::IntensiveCare => "Intensive care",
            RoomClass::Other => "Other",
        }
    }

    fn key(self) -> &'static str {
        match self {
            RoomClass::ClassIb => "class_ib",
            RoomClass::ClassIi => "class_ii",
            RoomClass::IntensiveCare => "intensive_care",
            RoomClass::Other => "other",
        }
    }
}

impl TestKind {
    pub const ALL: [TestKind; 8] = [
        TestKind::Airflow,
        TestKind::PressureDifference,
        TestKind::FlowDirection,
        TestKind::HepaLeakage,
        TestKind::ParticleCount,
        TestKind::RecoveryTime,
        TestKind::TemperatureHumidity,
        TestKind::Noise,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TestKind::Airflow => "Airflow and air change rate",
            TestKind::PressureDifference => "Pressure difference",
            TestKind::FlowDirection => "Airflow direction",
            TestKind::HepaLeakage => "HEPA filter leakage",
            TestKind::ParticleCount => "Particle count",
            TestKind::RecoveryTime => "Recovery time",
            TestKind::TemperatureHumidity => "Temperature and humidity",
            TestKind::Noise => "Noise level",
        }
    }

    fn key(self) -> &'static str {
        match self {
            TestKind::Airflow => "airflow",
            TestKind::PressureDifference => "pressure_difference",
            TestKind::FlowDirection => "flow_direction",
            TestKind::HepaLeakage => "hepa_leakage",
            TestKind::ParticleCount => "particle_count",
            TestKind::RecoveryTime => "recovery_time",
            TestKind::TemperatureHumidity => "temperature_humidity",
            TestKind::Noise => "noise",
        }
    }
}

macro_rules! keyed_vocabulary {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $ty {
            type Err = HqError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                Self::ALL
                    .into_iter()
                    .find(|v| v.key() == wanted)
                    .ok_or_else(|| HqError::UnknownVariant {
                        what: $what,
                        value: s.to_string(),
                    })
            }
        }
    };
}

keyed_vocabulary!(TestMode, "test mode");
keyed_vocabulary!(FlowType, "flow type");
keyed_vocabulary!(RoomClass, "room class");
keyed_vocabulary!(TestKind, "test kind");
keyed_vocabulary!(DocumentFormat, "document format");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_key() {
        for kind in TestKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        for class in RoomClass::ALL {
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{class}\""));
        }
    }

    #[test]
    fn parse_accepts_dashes_and_case() {
        assert_eq!("Class-IB".parse::<RoomClass>().unwrap(), RoomClass::ClassIb);
        assert_eq!("in-operation".parse::<TestMode>().unwrap(), TestMode::InOperation);
        assert_eq!("hepa_leakage".parse::<TestKind>().unwrap(), TestKind::HepaLeakage);
        assert!("sideways".parse::<FlowType>().is_err());
    }
}
