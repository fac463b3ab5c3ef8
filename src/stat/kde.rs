use crate::ir::DensityCurve;
use crate::scale;

/// Samples per density curve.
pub const DENSITY_SAMPLES: usize = 1000;

/// Epanechnikov kernel at standardized distance `v`, scaled by `1/h`.
pub fn epanechnikov(v: f64, h: f64) -> f64 {
    if v.abs() <= 1.0 {
        0.75 * (1.0 - v * v) / h
    } else {
        0.0
    }
}

/// `h = (max - min) / divisor` over the facet's observed extent. A zero-width
/// extent is widened first so `h` stays positive.
pub fn bandwidth(extent: (f64, f64), divisor: f64) -> f64 {
    let (min, max) = scale::widen_degenerate(extent.0, extent.1);
    (max - min) / divisor.max(f64::MIN_POSITIVE)
}

/// Kernel density of `values` sampled at `samples` evenly spaced points over `grid`.
///
/// Each sample is the mean kernel contribution; only values within `h` of the
/// sample point are visited.
pub fn density_curve(values: &[f64], h: f64, grid: (f64, f64), samples: usize) -> DensityCurve {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || !(h > 0.0) {
        return DensityCurve::default();
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let samples = samples.max(2);
    let step = (grid.1 - grid.0) / (samples - 1) as f64;

    let points = (0..samples)
        .map(|i| {
            let x = grid.0 + i as f64 * step;
            let lo = sorted.partition_point(|&v| v < x - h);
            let hi = sorted.partition_point(|&v| v <= x + h);
            let sum: f64 = sorted[lo..hi].iter().map(|&v| epanechnikov((x - v) / h, h)).sum();
            (x, sum / n)
        })
        .collect();

    DensityCurve { points }
}
