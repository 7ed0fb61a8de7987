use crate::report::model::DashboardModel;
use anyhow::Context;
use rulcore::client::PredictionResult;
use rulcore::processing::MergedRow;
use rulcore::store::{format_rul, KPI_PLACEHOLDER};
use rulcore::Subsystem;
use std::fmt::Write;

pub fn render_prediction(subsystem: Subsystem, result: &PredictionResult) -> String {
    let mut line = format!(
        "{} — Predicted RUL: {} {}",
        subsystem.label(),
        format_rul(result.predicted_rul),
        result.units
    );
    if let Some(version) = &result.model_version {
        let _ = write!(line, " (model {version})");
    }
    line
}

/// Merged rows as CSV, upload order preserved.
pub fn render_rows(subsystem: Subsystem, rows: &[MergedRow]) -> anyhow::Result<String> {
    let Some(first) = rows.first() else {
        return Ok(format!("{}: no batch results yet\n", subsystem.label()));
    };

    let columns: Vec<&str> = first.record.columns().collect();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(
            std::iter::once("#")
                .chain(columns.iter().copied())
                .chain(["predicted_rul", "units"]),
        )
        .context("writing rows header")?;

    for (idx, row) in rows.iter().enumerate() {
        let (rul, units) = match (&row.prediction, &row.error) {
            (Some(prediction), _) => (format_rul(prediction.predicted_rul), prediction.units.clone()),
            (None, Some(error)) => (format!("error: {error}"), String::new()),
            (None, None) => (KPI_PLACEHOLDER.to_string(), String::new()),
        };
        let mut line = Vec::with_capacity(columns.len() + 3);
        line.push((idx + 1).to_string());
        line.extend(
            columns
                .iter()
                .map(|column| row.record.get(column).map(ToString::to_string).unwrap_or_default()),
        );
        line.push(rul);
        line.push(units);
        writer.write_record(&line).context("writing merged row")?;
    }

    let bytes = writer.into_inner().context("flushing rows")?;
    String::from_utf8(bytes).context("rows are not UTF-8")
}

/// KPI cards followed by one line per subsystem batch.
pub fn render_summary(model: &DashboardModel) -> String {
    let mut out = String::new();
    for summary in &model.subsystems {
        let _ = writeln!(out, "{} RUL (last): {}", summary.subsystem.label(), summary.kpi);
    }
    let _ = writeln!(out);
    for summary in &model.subsystems {
        match summary.stats {
            Some(stats) => {
                let _ = writeln!(
                    out,
                    "{}: {} rows, mean {}, min {}, max {}",
                    summary.subsystem.label(),
                    summary.row_count,
                    format_rul(stats.mean),
                    format_rul(stats.min),
                    format_rul(stats.max)
                );
            }
            None => {
                let _ = writeln!(out, "{}: {} rows", summary.subsystem.label(), summary.row_count);
            }
        }
        if summary.unreadable_rows > 0 {
            let _ = writeln!(out, "  {} rows without a readable prediction", summary.unreadable_rows);
        }
    }
    let _ = writeln!(
        out,
        "\nsubmissions: {} committed, {} failed, {} ignored",
        model.metrics.committed, model.metrics.failed, model.metrics.ignored
    );
    out
}
