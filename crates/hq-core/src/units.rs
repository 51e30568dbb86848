// hq-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, Length as UomLength, Velocity as UomVelocity, Volume as UomVolume,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Velocity = UomVelocity;
pub type Volume = UomVolume;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

/// Volume flow in cubic meters per hour, the canonical airflow unit of reports.
#[inline]
pub fn m3ph(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_hour;
    VolumeRate::new::<cubic_meter_per_hour>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn as_m3(v: Volume) -> f64 {
    use uom::si::volume::cubic_meter;
    v.get::<cubic_meter>()
}

#[inline]
pub fn as_m3ph(v: VolumeRate) -> f64 {
    use uom::si::volume_rate::cubic_meter_per_hour;
    v.get::<cubic_meter_per_hour>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tolerances, nearly_equal};

    #[test]
    fn constructors_smoke() {
        let _l = m(3.0);
        let _a = m2(20.0);
        let _q = m3ph(972.0);
        let _u = mps(0.45);
    }

    #[test]
    fn area_times_length_is_volume() {
        let v: Volume = m2(20.0) * m(3.0);
        assert!(nearly_equal(as_m3(v), 60.0, Tolerances::default()));
    }

    #[test]
    fn face_velocity_flow_in_cubic_meters_per_hour() {
        let q: VolumeRate = mps(0.5) * m2(0.36);
        assert!(nearly_equal(as_m3ph(q), 648.0, Tolerances::default()));
    }
}
