use crate::color::{ColorAssignment, ColorKey, GroupRank};
use crate::ir::{Bin, BinSegment, Domain};
use std::collections::BTreeMap;

/// Sturges' rule, clamped to the accepted bin count range.
pub fn sturges(n: usize) -> usize {
    let n = n.max(1) as f64;
    (n.log2().ceil() as usize + 1).clamp(1, 100)
}

/// One value to bin, with its color key.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSample {
    pub value: f64,
    pub key: ColorKey,
}

/// Count samples into `bin_count` contiguous bins spanning `domain`.
///
/// Bins are half-open except the last, which is closed. Values outside the
/// domain are not counted. Segments inside a bin follow the color group order.
pub fn compute_bins(samples: &[BinSample], domain: (f64, f64), bin_count: usize, colors: &ColorAssignment) -> Vec<Bin> {
    let (lo, hi) = domain;
    if bin_count == 0 || !(hi > lo) {
        return Vec::new();
    }
    let width = (hi - lo) / bin_count as f64;

    let mut groups: Vec<BTreeMap<GroupRank, (ColorKey, usize)>> = vec![BTreeMap::new(); bin_count];
    for sample in samples {
        let v = sample.value;
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
        groups[idx]
            .entry(colors.rank(&sample.key))
            .or_insert_with(|| (sample.key.clone(), 0))
            .1 += 1;
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            let segments: Vec<BinSegment> = group
                .into_values()
                .map(|(key, count)| BinSegment {
                    key: colors.label(&key),
                    color: colors.color_for_key(&key),
                    count,
                    height_px: 0.0,
                    offset_px: 0.0,
                })
                .collect();
            Bin {
                x0: lo + i as f64 * width,
                x1: if i + 1 == bin_count { hi } else { lo + (i + 1) as f64 * width },
                total: segments.iter().map(|s| s.count).sum(),
                height_px: 0.0,
                segments,
            }
        })
        .collect()
}

/// Fill in pixel heights against the resolved count axis.
///
/// The bin height follows its total on the y-scale, clamped to the cell; each
/// segment takes its share of that height in proportion to its count.
pub fn apply_pixel_heights(bins: &mut [Bin], y_domain: &Domain, cell_height: f64) {
    let span = y_domain.span();
    for bin in bins.iter_mut() {
        bin.height_px = if bin.total == 0 || span <= 0.0 {
            0.0
        } else {
            ((bin.total as f64 - y_domain.min) / span).clamp(0.0, 1.0) * cell_height
        };

        let mut offset = 0.0;
        for seg in bin.segments.iter_mut() {
            seg.height_px = if bin.total == 0 {
                0.0
            } else {
                seg.count as f64 / bin.total as f64 * bin.height_px
            };
            seg.offset_px = offset;
            offset += seg.height_px;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisMode, ChartKind};
    use crate::data::Dataset;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn plain(values: &[f64]) -> Vec<BinSample> {
        values.iter().map(|&value| BinSample { value, key: ColorKey::Default }).collect()
    }

    #[test]
    fn test_two_bins_last_closed() {
        let colors = ColorAssignment::uniform();
        let bins = compute_bins(&plain(&[10.0, 20.0, 30.0, 40.0]), (10.0, 40.0), 2, &colors);
        assert_eq!(bins.len(), 2);
        assert_eq!((bins[0].x0, bins[0].x1), (10.0, 25.0));
        assert_eq!((bins[1].x0, bins[1].x1), (25.0, 40.0));
        assert_eq!(bins[0].total, 2);
        assert_eq!(bins[1].total, 2);
    }

    #[test]
    fn test_out_of_domain_not_counted() {
        let colors = ColorAssignment::uniform();
        let bins = compute_bins(&plain(&[5.0, 10.0, 40.0, 41.0]), (10.0, 40.0), 3, &colors);
        assert_eq!(bins.iter().map(|b| b.total).sum::<usize>(), 2);
    }

    #[test]
    fn test_segments_follow_color_order() {
        let data = Dataset::from_json(&json!([
            {"pop": "b", "v": 1}, {"pop": "a", "v": 1}, {"pop": "b", "v": 2}
        ]))
        .unwrap()
        .records;
        let colors = ColorAssignment::build(&data, &["pop".into()], ChartKind::Histogram, "v");
        let samples: Vec<BinSample> = data
            .iter()
            .map(|r| BinSample { value: r.number("v").unwrap(), key: colors.key_of(r) })
            .collect();
        let bins = compute_bins(&samples, (0.0, 4.0), 1, &colors);
        let keys: Vec<&str> = bins[0].segments.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(bins[0].segments[1].count, 2);
    }

    #[test]
    fn test_pixel_heights_sum_to_bin_height() {
        let colors = ColorAssignment::uniform();
        let mut bins = compute_bins(&plain(&[1.0, 1.0, 3.0]), (0.0, 4.0), 2, &colors);
        let y = Domain::new(0.0, 4.0, AxisMode::Free);
        apply_pixel_heights(&mut bins, &y, 100.0);
        assert_relative_eq!(bins[0].height_px, 50.0);
        assert_relative_eq!(bins[1].height_px, 25.0);
        for bin in &bins {
            let sum: f64 = bin.segments.iter().map(|s| s.height_px).sum();
            assert_relative_eq!(sum, bin.height_px);
        }
    }

    #[test]
    fn test_proportional_stacking_under_define_range() {
        // Group of 2 inside a bin of 4 and inside a bin of 8, y fixed to [2, 10].
        let mk = |total: usize| Bin {
            x0: 0.0,
            x1: 1.0,
            total,
            height_px: 0.0,
            segments: vec![
                BinSegment { key: "g".into(), color: "#000000".into(), count: 2, height_px: 0.0, offset_px: 0.0 },
                BinSegment { key: "h".into(), color: "#ffffff".into(), count: total - 2, height_px: 0.0, offset_px: 0.0 },
            ],
        };
        let mut bins = vec![mk(4), mk(8)];
        let y = Domain::new(2.0, 10.0, AxisMode::DefineRange);
        apply_pixel_heights(&mut bins, &y, 1.0);
        assert_relative_eq!(bins[0].segments[0].height_px, 0.125);
        assert_relative_eq!(bins[1].segments[0].height_px, 0.1875);
        assert_relative_eq!(bins[1].segments[1].offset_px, 0.1875);
    }

    #[test]
    fn test_sturges() {
        assert_eq!(sturges(0), 1);
        assert_eq!(sturges(1), 1);
        assert_eq!(sturges(100), 8);
    }
}
