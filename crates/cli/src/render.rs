use salescast_core::diagnostics::{preview_rows, DatasetSummary, ForecastSummary};
use salescast_core::domain::{Dataset, ForecastResult};

pub fn preview(dataset: &Dataset, limit: usize) -> String {
    let rows = preview_rows(dataset, limit);
    let mut out = format!("{:<12} {:>14}\n", "date", "sales");
    for p in rows {
        let value = p.actual.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:<12} {:>14}\n", p.timestamp.format("%Y-%m-%d"), value));
    }
    out.push_str(&format!("Showing first {} of {} rows\n", rows.len(), dataset.len()));
    out
}

pub fn dataset_summary(summary: &DatasetSummary) -> String {
    let mut out = format!(
        "{} rows, {} to {} ({} days)\naverage {:.2}, median {:.2}, gaps {}\n",
        summary.rows,
        summary.date_start,
        summary.date_end,
        summary.num_days,
        summary.avg_sales,
        summary.median_sales,
        summary.missing_gaps,
    );
    if !summary.reliable {
        out.push_str("Warning: fewer than 30 rows; forecasts may be unreliable.\n");
    }
    out
}

pub fn forecast(result: &ForecastResult, summary: &ForecastSummary) -> String {
    let mut out = format!("{:<12} {:>14} {:>14} {:>14}\n", "date", "forecast", "lower", "upper");
    for p in result.horizon() {
        let cell = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<12} {:>14} {:>14} {:>14}\n",
            p.timestamp().format("%Y-%m-%d"),
            cell(p.predicted()),
            cell(p.lower_bound()),
            cell(p.upper_bound()),
        ));
    }

    match summary.average {
        Some(avg) => out.push_str(&format!(
            "{}-day total {:.2}, daily average {avg:.2}\n",
            summary.horizon_days, summary.total
        )),
        None => out.push_str("No forecast points returned.\n"),
    }
    if summary.low_confidence {
        out.push_str("Low confidence: the history is short, treat this forecast with caution.\n");
    }
    out
}
