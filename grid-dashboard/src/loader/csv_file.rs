use std::{fs::File, path::Path};

use csv::StringRecord;
use grid_client::{
    domain::{timestamp::parse_timestamp, Reading, ReadingTable},
    AnalyticsError,
};

/// Columns every telemetry export must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "timestamp",
    "power_consumption_kw",
    "solar_power_kw",
    "wind_power_kw",
    "grid_supply_kw",
    "electricity_price_usdkwh",
];

/// Header positions of the required columns, resolved once per file.
struct ColumnIndex {
    timestamp: usize,
    power_consumption_kw: usize,
    solar_power_kw: usize,
    wind_power_kw: usize,
    grid_supply_kw: usize,
    electricity_price_usdkwh: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, AnalyticsError> {
        let find = |name: &str| -> Result<usize, AnalyticsError> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    AnalyticsError::Load(format!(
                        "missing required column '{name}' (expected {})",
                        REQUIRED_COLUMNS.join(", ")
                    ))
                })
        };

        Ok(Self {
            timestamp: find("timestamp")?,
            power_consumption_kw: find("power_consumption_kw")?,
            solar_power_kw: find("solar_power_kw")?,
            wind_power_kw: find("wind_power_kw")?,
            grid_supply_kw: find("grid_supply_kw")?,
            electricity_price_usdkwh: find("electricity_price_usdkwh")?,
        })
    }
}

fn parse_measurement(record: &StringRecord, idx: usize, name: &str, line: u64) -> Result<f64, AnalyticsError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| AnalyticsError::Load(format!("line {line}: missing value for '{name}'")))?;

    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| AnalyticsError::Load(format!("line {line}: invalid {name} '{raw}': {e}")))?;

    if !value.is_finite() || value < 0.0 {
        return Err(AnalyticsError::Load(format!(
            "line {line}: {name} must be a non-negative number, got '{raw}'"
        )));
    }

    Ok(value)
}

fn record_to_reading(record: &StringRecord, cols: &ColumnIndex, line: u64) -> Result<Reading, AnalyticsError> {
    let ts_str = record.get(cols.timestamp).unwrap_or("");
    let timestamp = parse_timestamp(ts_str).ok_or_else(|| AnalyticsError::Parse {
        line,
        value: ts_str.to_string(),
    })?;

    Ok(Reading {
        timestamp,
        power_consumption_kw: parse_measurement(record, cols.power_consumption_kw, "power_consumption_kw", line)?,
        solar_power_kw: parse_measurement(record, cols.solar_power_kw, "solar_power_kw", line)?,
        wind_power_kw: parse_measurement(record, cols.wind_power_kw, "wind_power_kw", line)?,
        grid_supply_kw: parse_measurement(record, cols.grid_supply_kw, "grid_supply_kw", line)?,
        electricity_price_usdkwh: parse_measurement(
            record,
            cols.electricity_price_usdkwh,
            "electricity_price_usdkwh",
            line,
        )?,
    })
}

/// Load a comma-separated telemetry export.
pub fn load_readings<P: AsRef<Path>>(path: P) -> Result<ReadingTable, AnalyticsError> {
    load_readings_with_delimiter(path, b',')
}

/// Load a telemetry export with an arbitrary single-byte delimiter (`|` for
/// `.dat` files).
///
/// Rows are kept in file order; nothing is sorted or deduplicated.
pub fn load_readings_with_delimiter<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<ReadingTable, AnalyticsError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AnalyticsError::Load(format!("failed to open '{}': {e}", path.display())))?;
    let mut rdr = csv::ReaderBuilder::new().delimiter(delimiter).from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| AnalyticsError::Load(format!("failed to read headers of '{}': {e}", path.display())))?
        .clone();
    let cols = ColumnIndex::resolve(&headers)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| AnalyticsError::Load(format!("failed to read record of '{}': {e}", path.display())))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let reading = match record_to_reading(&record, &cols, line) {
            Ok(r) => r,
            Err(e) => {
                metrics::counter!("dataset_parse_errors_total").increment(1);
                tracing::error!(error = %e, path = %path.display(), "rejecting telemetry dataset");
                return Err(e);
            }
        };
        rows.push(reading);
    }

    if rows.is_empty() {
        return Err(AnalyticsError::Load(format!("'{}' contains no readings", path.display())));
    }

    let table = ReadingTable::new(rows);
    metrics::gauge!("dataset_rows_loaded").set(table.len() as f64);
    if let Some((first, last)) = table.date_bounds() {
        tracing::info!(
            rows = table.len(),
            first_date = %first,
            last_date = %last,
            path = %path.display(),
            "telemetry dataset loaded"
        );
    }

    Ok(table)
}
