//! Non-uniform samplers on bounded and circular intervals.
//!
//! All samplers clamp `mode` into `[low, high]` and draw only from the
//! supplied uniform source, so a seeded source reproduces the same values.
//! An empty, inverted or NaN interval yields `low` without drawing.

use std::f64::consts::TAU;

use rand::Rng;

const TRIANGULAR_DRAWS: usize = 3;

fn clamp_mode(low: f64, high: f64, mode: f64) -> f64 {
    if mode > high {
        high
    } else if mode < low {
        low
    } else {
        mode
    }
}

fn unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Approximate triangular sample peaking at `mode`.
///
/// The mean of three uniform draws is pushed through the piecewise-linear
/// inverse anchored at `mode`: the lower half maps onto `[low, mode]`, the
/// upper half onto `[mode, high]`.
pub fn triangular<R: Rng + ?Sized>(low: f64, high: f64, mode: f64, rng: &mut R) -> f64 {
    if !(low < high) {
        return low;
    }
    let mode = clamp_mode(low, high, mode);
    let mut sum = 0.0;
    for _ in 0..TRIANGULAR_DRAWS {
        sum += unit(rng);
    }
    let average = sum / TRIANGULAR_DRAWS as f64;

    let value = if average < 0.5 {
        average * 2.0 * (mode - low) + low
    } else {
        (average - 0.5) * 2.0 * (high - mode) + mode
    };
    value.clamp(low, high)
}

/// Sample on the circular domain `[low, high)`, where `mode` rotates the
/// peak instead of pinning it against an edge. Mass that would fall past
/// `high` wraps around to `low`.
pub fn rotating<R: Rng + ?Sized>(low: f64, high: f64, mode: f64, rng: &mut R) -> f64 {
    if !(low < high) {
        return low;
    }
    let mode = clamp_mode(low, high, mode);
    let range = high - low;
    let ratio = (mode - low) / range;
    let displacement = ratio - 0.5 + 1.0;

    let mut value = triangular(0.0, 1.0, 0.5, rng) + displacement;
    value -= value.floor();
    (range * value + low).clamp(low, high)
}

/// Daily activity curve: `rotating` with the mode warped through a cosine so
/// the peak follows local midday and nothing is clipped at the day boundary.
pub fn solar<R: Rng + ?Sized>(low: f64, high: f64, mode: f64, rng: &mut R) -> f64 {
    if !(low < high) {
        return low;
    }
    let mode = clamp_mode(low, high, mode);
    let range = high - low;
    let ratio = (mode - low) / range;
    let target = 1.0 - ((TAU * ratio).cos() + 1.0);
    (range * rotating(0.0, 1.0, target, rng) + low).clamp(low, high)
}

/// Bin `runs` samples of a sampler on `[0, 1)` into `buckets` equal-width
/// bins. Used to eyeball or assert the shape of a distribution.
pub fn histogram<R, F>(
    sampler: F,
    mode: f64,
    buckets: usize,
    runs: usize,
    rng: &mut R,
) -> Vec<u64>
where
    R: Rng + ?Sized,
    F: Fn(f64, f64, f64, &mut R) -> f64,
{
    let mut bins = vec![0_u64; buckets];
    if buckets == 0 {
        return bins;
    }
    for _ in 0..runs {
        let value = sampler(0.0, 1.0, mode, rng);
        let index = ((value * buckets as f64).floor() as usize).min(buckets - 1);
        bins[index] += 1;
    }
    bins
}
