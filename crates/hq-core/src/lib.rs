//! hq-core: stable foundation for hvacqual.
//!
//! Contains:
//! - units (uom SI types + constructors for room geometry and airflow)
//! - numeric (Real + tolerances + rounding helpers)
//! - ids (UUID-backed identifiers for reports, rooms and tests)
//! - kinds (fixed vocabularies: test mode, flow type, room class, test kind, document format)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod kinds;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{HqError, HqResult};
pub use ids::*;
pub use kinds::*;
pub use numeric::*;
pub use units::*;
