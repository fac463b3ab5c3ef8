use super::student_t::t_quantile;
use crate::error::{PlotError, Result};
use crate::ir::{Point, RegressionBand, RegressionSample};

/// Points sampled along each fitted line.
pub const REGRESSION_SAMPLES: usize = 100;

/// Two-sided confidence level of the band.
pub const CONFIDENCE: f64 = 0.95;

/// Ordinary least squares fit with a confidence band for the mean response.
///
/// Fails with a `NumericError` when fewer than three finite pairs remain or
/// the x values have no variance.
pub fn fit_band(points: &[Point], samples: usize) -> Result<RegressionBand> {
    let pts: Vec<Point> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let n = pts.len();
    if n < 3 {
        return Err(PlotError::numeric(format!("regression needs at least 3 points, got {}", n)));
    }
    let nf = n as f64;

    let (sum_x, sum_y, sum_xy, sum_x2) = pts.iter().fold((0.0, 0.0, 0.0, 0.0), |(sx, sy, sxy, sx2), (x, y)| {
        (sx + x, sy + y, sxy + x * y, sx2 + x * x)
    });

    let mean_x = sum_x / nf;
    let ss_x: f64 = pts.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let denom = nf * sum_x2 - sum_x * sum_x;
    if !(ss_x > 0.0) || denom == 0.0 {
        return Err(PlotError::numeric("regression x values have zero variance"));
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;

    let rss: f64 = pts.iter().map(|(x, y)| (y - (intercept + slope * x)).powi(2)).sum();
    let s = (rss / (nf - 2.0)).sqrt();
    let t = t_quantile(1.0 - (1.0 - CONFIDENCE) / 2.0, nf - 2.0);

    let x_min = pts.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let x_max = pts.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let samples = samples.max(2);
    let step = (x_max - x_min) / (samples - 1) as f64;

    let samples = (0..samples)
        .map(|i| {
            let x = x_min + i as f64 * step;
            let y_predicted = intercept + slope * x;
            let se = s * (1.0 / nf + (x - mean_x).powi(2) / ss_x).sqrt();
            let half = t * se;
            RegressionSample {
                x,
                y_predicted,
                ci_lower: y_predicted - half,
                ci_upper: y_predicted + half,
            }
        })
        .collect();

    Ok(RegressionBand { slope, intercept, n, samples })
}
