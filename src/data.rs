use crate::error::{PlotError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// A single cell value. Records only ever hold JSON-compatible scalars.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

static NULL: Scalar = Scalar::Null;

impl Scalar {
    /// Convert a JSON value. Arrays and objects are not scalars.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Number(n) => Some(n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null)),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Bool(b) => Some(Scalar::Text(b.to_string())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parse a CSV cell: blanks and NA markers are null, numeric text becomes a number.
    pub fn parse_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        match trimmed {
            "" | "NA" | "null" | "NULL" | "None" => Scalar::Null,
            _ => match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Scalar::Number(v),
                _ => Scalar::Text(trimmed.to_string()),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Finite numeric value, if any. Text is never coerced here; coercion
    /// happens once at ingestion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Categorical key for grouping. Blank text counts as null.
    pub fn category(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Number(v) => Some(format_number(*v)),
            Scalar::Text(s) if s.trim().is_empty() => None,
            Scalar::Text(s) => Some(s.clone()),
        }
    }
}

/// Render a number without a trailing `.0` for integral values.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

pub type Fields = BTreeMap<String, Scalar>;

/// One introgressed fragment on a chromosome.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentRecord {
    pub chrom: String,
    pub start: f64,
    pub end: f64,
    fields: Fields,
}

impl FragmentRecord {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Individual the fragment was called in, used as the track lane.
    pub fn individual(&self) -> Option<String> {
        self.fields.get("individual").and_then(Scalar::category)
    }
}

/// A per-sample row with a geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRecord {
    pub latitude: f64,
    pub longitude: f64,
    fields: Fields,
}

/// Any other aggregated row (per individual or per population summaries).
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Fragment,
    Summary,
    Map,
}

/// Immutable input row, validated once when it enters the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DataRecord {
    Fragment(FragmentRecord),
    Summary(SummaryRecord),
    Map(MapRecord),
}

impl DataRecord {
    /// Classify a raw row into one of the record variants.
    ///
    /// Rows carrying `chrom`/`start`/`end` are fragments, rows carrying
    /// `latitude`/`longitude` (or `lat`/`lon`) are map rows, the rest are summaries.
    pub fn from_fields(fields: Fields) -> std::result::Result<Self, String> {
        if fields.contains_key("chrom") && fields.contains_key("start") && fields.contains_key("end") {
            let chrom = fields["chrom"]
                .category()
                .ok_or_else(|| "fragment has no chromosome".to_string())?;
            let start = fields["start"]
                .as_f64()
                .ok_or_else(|| "fragment start is not numeric".to_string())?;
            let end = fields["end"]
                .as_f64()
                .ok_or_else(|| "fragment end is not numeric".to_string())?;
            if start > end {
                return Err(format!("fragment start {} is after end {}", start, end));
            }
            return Ok(DataRecord::Fragment(FragmentRecord { chrom, start, end, fields }));
        }

        let lat_key = ["latitude", "lat"].into_iter().find(|k| fields.contains_key(*k));
        let lon_key = ["longitude", "lon"].into_iter().find(|k| fields.contains_key(*k));
        if let (Some(lat_key), Some(lon_key)) = (lat_key, lon_key) {
            let latitude = fields[lat_key]
                .as_f64()
                .filter(|v| (-90.0..=90.0).contains(v))
                .ok_or_else(|| format!("'{}' is not a valid latitude", lat_key))?;
            let longitude = fields[lon_key]
                .as_f64()
                .filter(|v| (-180.0..=180.0).contains(v))
                .ok_or_else(|| format!("'{}' is not a valid longitude", lon_key))?;
            return Ok(DataRecord::Map(MapRecord { latitude, longitude, fields }));
        }

        Ok(DataRecord::Summary(SummaryRecord { fields }))
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            DataRecord::Fragment(_) => RecordKind::Fragment,
            DataRecord::Summary(_) => RecordKind::Summary,
            DataRecord::Map(_) => RecordKind::Map,
        }
    }

    pub fn fields(&self) -> &Fields {
        match self {
            DataRecord::Fragment(r) => &r.fields,
            DataRecord::Summary(r) => &r.fields,
            DataRecord::Map(r) => &r.fields,
        }
    }

    /// Field value; missing fields read as null.
    pub fn get(&self, field: &str) -> &Scalar {
        self.fields().get(field).unwrap_or(&NULL)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_f64()
    }

    pub fn category(&self, field: &str) -> Option<String> {
        self.get(field).category()
    }

    pub fn as_fragment(&self) -> Option<&FragmentRecord> {
        match self {
            DataRecord::Fragment(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRecord> {
        match self {
            DataRecord::Map(r) => Some(r),
            _ => None,
        }
    }
}

/// The record snapshot for one computation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<DataRecord>,
}

impl Dataset {
    pub fn new(records: Vec<DataRecord>) -> Self {
        Self { records }
    }

    /// Create a Dataset from a JSON array of flat objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value.as_array().ok_or_else(|| PlotError::Ingest {
            row: 0,
            message: "input data must be a JSON array of objects".to_string(),
        })?;

        let mut records = Vec::with_capacity(array.len());
        for (row, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or_else(|| PlotError::Ingest {
                row,
                message: "items in array must be objects".to_string(),
            })?;

            let mut fields = Fields::new();
            for (key, val) in obj {
                let scalar = Scalar::from_json(val).ok_or_else(|| PlotError::Ingest {
                    row,
                    message: format!("unsupported value type for field '{}'", key),
                })?;
                fields.insert(key.clone(), scalar);
            }
            let record = DataRecord::from_fields(fields)
                .map_err(|message| PlotError::Ingest { row, message })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Read CSV with a header row.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let raw = result?;
            let fields: Fields = headers
                .iter()
                .zip(raw.iter())
                .map(|(h, cell)| (h.clone(), Scalar::parse_cell(cell)))
                .collect();
            let record = DataRecord::from_fields(fields)
                .map_err(|message| PlotError::Ingest { row, message })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of field names across all records.
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .flat_map(|r| r.fields().keys().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_records() {
        let data = Dataset::from_json(&json!([
            {"chrom": "1", "start": 100, "end": 250, "individual": "HG00096", "ancestry": "Neanderthal"},
            {"latitude": 51.5, "longitude": -0.12, "region": "Europe"},
            {"name": "S_French-1", "mean_length": 52000.0}
        ]))
        .unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data.records[0].kind(), RecordKind::Fragment);
        assert_eq!(data.records[1].kind(), RecordKind::Map);
        assert_eq!(data.records[2].kind(), RecordKind::Summary);

        let frag = data.records[0].as_fragment().unwrap();
        assert_eq!(frag.length(), 150.0);
        assert_eq!(frag.individual(), Some("HG00096".to_string()));
    }

    #[test]
    fn test_invalid_fragment_rejected() {
        let res = Dataset::from_json(&json!([
            {"chrom": "1", "start": 10, "end": 20},
            {"chrom": "2", "start": 30, "end": 5}
        ]));
        match res {
            Err(PlotError::Ingest { row, .. }) => assert_eq!(row, 1),
            other => panic!("Expected ingest error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_value_rejected() {
        let res = Dataset::from_json(&json!([{"a": [1, 2]}]));
        assert!(res.is_err());
    }

    #[test]
    fn test_empty_array_is_empty_dataset() {
        let data = Dataset::from_json(&json!([])).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_from_csv() {
        let csv = "name,region,length\nA,Europe,12.5\nB,,NA\nC,East Asia,7\n";
        let data = Dataset::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.records[0].number("length"), Some(12.5));
        assert!(data.records[1].get("region").is_null());
        assert!(data.records[1].get("length").is_null());
        assert_eq!(data.records[2].category("length"), Some("7".to_string()));
        assert!(data.records[0].get("missing").is_null());
    }

    #[test]
    fn test_scalar_category() {
        assert_eq!(Scalar::Number(3.0).category(), Some("3".to_string()));
        assert_eq!(Scalar::Number(2.5).category(), Some("2.5".to_string()));
        assert_eq!(Scalar::Text("  ".to_string()).category(), None);
        assert_eq!(Scalar::Null.category(), None);
    }
}
