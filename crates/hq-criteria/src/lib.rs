//! hq-criteria: measured payloads, derived values and pass/fail evaluation.
//!
//! Flow rates are m³/h throughout; air-change rates are 1/h.

pub mod aggregate;
pub mod calc;
pub mod evaluate;
pub mod iso;
pub mod measure;
pub mod table;

pub use aggregate::{KindVerdict, RoomVerdict, report_verdict, room_verdict};
pub use calc::{AirChangeRate, AirflowDerived, air_change_rate, derive_airflow, room_volume};
pub use evaluate::{Derived, RoomContext, TestOutcome, evaluate};
pub use iso::{implied_iso_class, iso_class_limit, published_class_limit};
pub use measure::*;
pub use table::{AggregationPolicy, CriteriaTable, Range, RoomClassCriteria};

pub type CriteriaResult<T> = Result<T, CriteriaError>;

#[derive(thiserror::Error, Debug)]
pub enum CriteriaError {
    #[error("Invalid criteria: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
