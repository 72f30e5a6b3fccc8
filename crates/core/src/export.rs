//! CSV export of the combined series: `date,type,value`, one line per point, in series order.

use crate::domain::ForecastResult;
use crate::error::ExportError;
use std::path::{Path, PathBuf};

const HEADER: &str = "date,type,value";

pub fn to_csv(result: &ForecastResult) -> Result<String, ExportError> {
    if result.is_empty() {
        return Err(ExportError::EmptyResult);
    }

    let mut out = String::with_capacity(HEADER.len() + 1 + result.len() * 28);
    out.push_str(HEADER);
    out.push('\n');

    for p in result.points() {
        let (kind, value) = match (p.actual(), p.predicted()) {
            (Some(v), _) => ("historical", v),
            (None, Some(v)) => ("forecast", v),
            (None, None) => continue,
        };
        out.push_str(&format!(
            "{},{},{}\n",
            p.timestamp().format("%Y-%m-%d"),
            kind,
            format_value(value)
        ));
    }

    Ok(out)
}

/// Plain decimal: no grouping, no currency, no exponent. `-0` prints as `0`.
fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

pub fn export_file_name(horizon_days: usize) -> String {
    format!("sales_forecast_{horizon_days}_days.csv")
}

/// Writes `to_csv(result)` as `<dir>/sales_forecast_<horizon>_days.csv`.
pub fn write_csv(
    dir: &Path,
    horizon_days: usize,
    result: &ForecastResult,
) -> Result<PathBuf, ExportError> {
    let body = to_csv(result)?;
    let path = dir.join(export_file_name(horizon_days));
    std::fs::write(&path, body.as_bytes()).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), points = result.len(), "wrote forecast export");
    Ok(path)
}
