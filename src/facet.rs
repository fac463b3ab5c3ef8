use crate::data::DataRecord;
use crate::ir::{Bounds, FacetLayout};
use crate::RenderOptions;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Genome order of a chromosome label: 1..22, then X, then X Prime.
pub fn chromosome_rank(label: &str) -> Option<u32> {
    let trimmed = label.trim();
    let name = trimmed
        .strip_prefix("chr")
        .or_else(|| trimmed.strip_prefix("CHR"))
        .or_else(|| trimmed.strip_prefix("Chr"))
        .unwrap_or(trimmed);
    match name {
        "X" | "x" => Some(23),
        "XPrime" | "X Prime" | "Xprime" | "X'" => Some(24),
        _ => name.parse::<u32>().ok().filter(|n| (1..=22).contains(n)),
    }
}

/// Chromosome comparator. Known labels come first in genome order; two unknown
/// labels compare equal so a stable sort keeps their incoming order.
pub fn chromosome_cmp(a: &str, b: &str) -> Ordering {
    match (chromosome_rank(a), chromosome_rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distinct non-null values of `field` in first-appearance order, then stably
/// sorted with the chromosome comparator.
pub fn facet_values(records: &[DataRecord], field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for value in records.iter().filter_map(|r| r.category(field)) {
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }
    values.sort_by(|a, b| chromosome_cmp(a, b));
    values
}

/// One grid cell and the records that fell into it.
#[derive(Debug, Clone)]
pub struct FacetPartition<'a> {
    pub facet_x: Option<String>,
    pub facet_y: Option<String>,
    pub row: usize,
    pub col: usize,
    pub bounds: Bounds,
    /// `(input index, record)` in input order.
    pub members: Vec<(usize, &'a DataRecord)>,
}

impl FacetPartition<'_> {
    pub fn record_indices(&self) -> Vec<usize> {
        self.members.iter().map(|(i, _)| *i).collect()
    }
}

struct FacetAxis {
    values: Vec<String>,
    index: HashMap<String, usize>,
}

impl FacetAxis {
    /// An axis is split only when its field has more than one distinct value.
    fn new(records: &[DataRecord], field: Option<&str>) -> Self {
        let values = field.map(|f| facet_values(records, f)).unwrap_or_default();
        let values = if values.len() > 1 { values } else { Vec::new() };
        let index = values.iter().enumerate().map(|(i, v)| (v.clone(), i)).collect();
        Self { values, index }
    }

    fn is_split(&self) -> bool {
        !self.values.is_empty()
    }

    fn count(&self) -> usize {
        self.values.len().max(1)
    }

    /// Cell index of a record, or `None` when a split axis sees a null value.
    fn slot(&self, record: &DataRecord, field: Option<&str>) -> Option<usize> {
        if !self.is_split() {
            return Some(0);
        }
        let value = record.category(field?)?;
        self.index.get(&value).copied()
    }

    fn label(&self, i: usize) -> Option<String> {
        self.values.get(i).cloned()
    }
}

/// Cell origin and size along one axis. A single cell takes the full extent.
fn cell_span(total: f64, count: usize, i: usize, padding: f64) -> (f64, f64) {
    let count = count.max(1);
    let step = total / count as f64;
    let size = if count > 1 { (step - padding).max(0.0) } else { total };
    (i as f64 * step, size)
}

/// Split records into facet cells, columns outer and rows inner.
///
/// Records with a null value on a split facet field belong to no cell.
pub fn partition_records<'a>(
    records: &'a [DataRecord],
    facet_x: Option<&str>,
    facet_y: Option<&str>,
    options: &RenderOptions,
) -> (FacetLayout, Vec<FacetPartition<'a>>) {
    let x_axis = FacetAxis::new(records, facet_x);
    let y_axis = FacetAxis::new(records, facet_y);
    let ncol = x_axis.count();
    let nrow = y_axis.count();

    let mut cells: Vec<Vec<(usize, &'a DataRecord)>> = vec![Vec::new(); ncol * nrow];
    for (idx, record) in records.iter().enumerate() {
        let (Some(col), Some(row)) = (x_axis.slot(record, facet_x), y_axis.slot(record, facet_y)) else {
            continue;
        };
        cells[col * nrow + row].push((idx, record));
    }

    let mut partitions = Vec::with_capacity(ncol * nrow);
    let mut members = cells.into_iter();
    for col in 0..ncol {
        for row in 0..nrow {
            let (x, width) = cell_span(options.width, ncol, col, options.padding);
            let (y, height) = cell_span(options.height, nrow, row, options.padding);
            partitions.push(FacetPartition {
                facet_x: x_axis.label(col),
                facet_y: y_axis.label(row),
                row,
                col,
                bounds: Bounds { x, y, width, height },
                members: members.next().unwrap_or_default(),
            });
        }
    }

    let layout = FacetLayout {
        nrow,
        ncol,
        width: options.width,
        height: options.height,
        x_values: x_axis.values,
        y_values: y_axis.values,
    };
    (layout, partitions)
}
