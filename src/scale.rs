use crate::config::AxisMode;
use crate::error::{PlotError, Result};
use crate::ir::Domain;

/// Fraction of the data range added on both ends of Free and Shared domains.
pub const PADDING_FRACTION: f64 = 0.05;

/// Half-width floor used to widen zero-width domains.
pub const MIN_HALF_WIDTH: f64 = 1e-6;

/// Relative half-width used to widen zero-width domains away from zero.
pub const RELATIVE_HALF_WIDTH: f64 = 1e-3;

/// Finite `[min, max]` of the values, or `None` when there are none.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    if min <= max {
        Some((min, max))
    } else {
        None
    }
}

/// Widen a zero-width range so downstream scales never divide by zero.
pub fn widen_degenerate(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        let half = (min.abs() * RELATIVE_HALF_WIDTH).max(MIN_HALF_WIDTH);
        (min - half, max + half)
    }
}

/// Expand a range by 5% on both ends.
pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        widen_degenerate(min, max)
    } else {
        let padding = (max - min) * PADDING_FRACTION;
        (min - padding, max + padding)
    }
}

/// Global domain across the whole record set, used unchanged by every facet.
pub fn shared_domain<I>(values: I) -> Domain
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = match extent(values) {
        Some((min, max)) => pad_range(min, max),
        None => widen_degenerate(0.0, 0.0),
    };
    Domain::new(min, max, AxisMode::Shared)
}

/// Resolve the domain of an axis that carries a data variable.
///
/// `local` is the facet-local extent; `shared` is the once-per-call global domain.
pub fn resolve_value_axis(
    mode: AxisMode,
    range: Option<(f64, f64)>,
    local: Option<(f64, f64)>,
    shared: Option<&Domain>,
) -> Result<Domain> {
    match mode {
        AxisMode::Free => {
            let (min, max) = match local {
                Some((min, max)) => pad_range(min, max),
                None => widen_degenerate(0.0, 0.0),
            };
            Ok(Domain::new(min, max, AxisMode::Free))
        }
        AxisMode::Shared => shared
            .copied()
            .ok_or_else(|| PlotError::config("Shared axis requested but no shared domain was computed")),
        AxisMode::DefineRange => {
            let (min, max) = range.ok_or_else(|| PlotError::config("DefineRange axis without a range"))?;
            let (min, max) = widen_degenerate(min, max);
            Ok(Domain::new(min, max, AxisMode::DefineRange))
        }
    }
}

/// Resolve a count or density axis. These are anchored at zero.
///
/// `shared_peak` is the peak across all facets; charts that cannot share this
/// axis pass `None`, which turns a Shared request into a `ConfigError`.
pub fn resolve_magnitude_axis(
    mode: AxisMode,
    range: Option<(f64, f64)>,
    local_peak: f64,
    shared_peak: Option<f64>,
) -> Result<Domain> {
    let anchored = |peak: f64| {
        if peak > 0.0 && peak.is_finite() {
            (0.0, peak + peak * PADDING_FRACTION)
        } else {
            (0.0, MIN_HALF_WIDTH)
        }
    };
    match mode {
        AxisMode::Free => {
            let (min, max) = anchored(local_peak);
            Ok(Domain::new(min, max, AxisMode::Free))
        }
        AxisMode::Shared => {
            let peak = shared_peak
                .ok_or_else(|| PlotError::config("Shared y-axis is not supported for histograms"))?;
            let (min, max) = anchored(peak);
            Ok(Domain::new(min, max, AxisMode::Shared))
        }
        AxisMode::DefineRange => resolve_value_axis(mode, range, None, None),
    }
}

/// Linear map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_domain_padding() {
        let d = resolve_value_axis(AxisMode::Free, None, Some((0.0, 10.0)), None).unwrap();
        assert_eq!(d.mode, AxisMode::Free);
        assert!((d.min - -0.5).abs() < 1e-12);
        assert!((d.max - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_widened() {
        let d = resolve_value_axis(AxisMode::Free, None, Some((5.0, 5.0)), None).unwrap();
        assert!(d.min < 5.0 && d.max > 5.0);
        assert!(d.span() < 0.1);
        assert!(d.span().is_finite());
    }

    #[test]
    fn test_empty_domain_widened() {
        let d = resolve_value_axis(AxisMode::Free, None, None, None).unwrap();
        assert!(d.span() > 0.0);
        assert!(d.min.is_finite() && d.max.is_finite());
    }

    #[test]
    fn test_define_range_unpadded() {
        let d = resolve_value_axis(AxisMode::DefineRange, Some((10.0, 40.0)), Some((0.0, 100.0)), None).unwrap();
        assert_eq!(d.bounds(), (10.0, 40.0));
        assert_eq!(d.mode, AxisMode::DefineRange);
    }

    #[test]
    fn test_shared_uses_global() {
        let shared = shared_domain(vec![1.0, 3.0, 11.0]);
        let d = resolve_value_axis(AxisMode::Shared, None, Some((1.0, 3.0)), Some(&shared)).unwrap();
        assert_eq!(d, shared);
        assert!((d.min - 0.5).abs() < 1e-12);
        assert!((d.max - 11.5).abs() < 1e-12);
    }

    #[test]
    fn test_magnitude_axis() {
        let d = resolve_magnitude_axis(AxisMode::Free, None, 20.0, None).unwrap();
        assert_eq!(d.bounds(), (0.0, 21.0));

        assert!(matches!(
            resolve_magnitude_axis(AxisMode::Shared, None, 20.0, None),
            Err(PlotError::Config(_))
        ));

        let d = resolve_magnitude_axis(AxisMode::Shared, None, 20.0, Some(40.0)).unwrap();
        assert_eq!(d.bounds(), (0.0, 42.0));

        let d = resolve_magnitude_axis(AxisMode::Free, None, 0.0, None).unwrap();
        assert!(d.max > 0.0);
    }

    #[test]
    fn test_extent_skips_non_finite() {
        assert_eq!(extent(vec![f64::NAN, 2.0, -1.0, f64::INFINITY]), Some((-1.0, 2.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_linear_scale() {
        let s = LinearScale::new((0.0, 10.0), (100.0, 0.0));
        assert_eq!(s.map(0.0), 100.0);
        assert_eq!(s.map(10.0), 0.0);
        assert_eq!(s.map(5.0), 50.0);
    }
}
