//! ISO 14644-1 cleanliness class from particle concentrations.

use crate::measure::ParticleChannel;

pub const ISO_MIN_CLASS: f64 = 1.0;
pub const ISO_MAX_CLASS: f64 = 9.0;

/// Maximum permitted concentration (particles/m³ ≥ `size_um`) for class `n`.
pub fn iso_class_limit(n: f64, size_um: f64) -> f64 {
    10f64.powf(n) * (0.1 / size_um).powf(2.08)
}

/// Class limit as published: at most three significant figures.
pub fn published_class_limit(n: f64, size_um: f64) -> f64 {
    round_significant(iso_class_limit(n, size_um), 3)
}

fn round_significant(v: f64, digits: i32) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let scale = 10f64.powi(v.abs().log10().floor() as i32 + 1 - digits);
    (v / scale).round() * scale
}

fn within_limit(channel: &ParticleChannel, tenths: i64) -> bool {
    let limit = published_class_limit(tenths as f64 / 10.0, channel.size_um);
    channel.count_per_m3 <= limit * (1.0 + 1e-9)
}

/// Smallest class, in 0.1 steps from class 1, whose published limits admit
/// every channel.
///
/// `None` when there is no usable channel, when any count is negative or
/// non-finite, or when no channel has a positive concentration. Channels with
/// a non-positive size are ignored.
pub fn implied_iso_class(channels: &[ParticleChannel]) -> Option<f64> {
    let usable: Vec<&ParticleChannel> = channels
        .iter()
        .filter(|c| c.size_um.is_finite() && c.size_um > 0.0)
        .collect();
    if usable
        .iter()
        .any(|c| !c.count_per_m3.is_finite() || c.count_per_m3 < 0.0)
    {
        return None;
    }

    let worst = usable
        .iter()
        .filter(|c| c.count_per_m3 > 0.0)
        .map(|c| c.count_per_m3.log10() + 2.08 * (c.size_um / 0.1).log10())
        .reduce(f64::max)?;

    // The exact formula lands within a step of the answer; walk up from just below it.
    let mut tenths = ((worst * 10.0).floor() as i64 - 2).max((ISO_MIN_CLASS * 10.0) as i64);
    while !usable.iter().all(|c| within_limit(c, tenths)) {
        tenths += 1;
    }
    Some(tenths as f64 / 10.0)
}
