use crate::client::PredictionResult;
use crate::math::{RulStats, StatsHelper};
use crate::processing::MergedRow;
use crate::schema::Subsystem;
use serde::Serialize;

/// Shown in place of a KPI that has not been produced yet.
pub const KPI_PLACEHOLDER: &str = "—";

/// Two-decimal rendering of a RUL value.
///
/// Exact binary ties round away from zero, so `0.125` shows as `0.13`.
/// Every other value is already rounded correctly by `{:.2}`.
pub fn format_rul(value: f64) -> String {
    // A tie at two decimals is (2k + 1) / 200, which only a double can hold
    // exactly when 8 * |value| is an odd integer.
    let eighths = value.abs() * 8.0;
    if value.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 == 1.0 {
        let hundredths = (value.abs() * 100.0).ceil().copysign(value);
        return format!("{:.2}", hundredths / 100.0);
    }
    format!("{:.2}", value)
}

/// Most recent single-record prediction for a subsystem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub predicted_rul: f64,
    pub units: String,
    pub model_version: Option<String>,
}

impl Kpi {
    /// Two-decimal rendering used by the summary cards.
    pub fn display(&self) -> String {
        format_rul(self.predicted_rul)
    }
}

impl From<&PredictionResult> for Kpi {
    fn from(result: &PredictionResult) -> Self {
        Self {
            predicted_rul: result.predicted_rul,
            units: result.units.clone(),
            model_version: result.model_version.clone(),
        }
    }
}

/// Current state of one subsystem panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsystemAggregate {
    rows: Vec<MergedRow>,
    kpi: Option<Kpi>,
}

impl SubsystemAggregate {
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn kpi(&self) -> Option<&Kpi> {
        self.kpi.as_ref()
    }

    pub fn kpi_display(&self) -> String {
        self.kpi
            .as_ref()
            .map(Kpi::display)
            .unwrap_or_else(|| KPI_PLACEHOLDER.to_string())
    }

    pub fn rul_stats(&self) -> Option<RulStats> {
        let values: Vec<f64> = self.rows.iter().filter_map(MergedRow::predicted_rul).collect();
        StatsHelper::summarize(&values)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.kpi.is_none()
    }
}

/// One line of the cross-subsystem dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemSummary {
    pub subsystem: Subsystem,
    pub kpi: String,
    pub row_count: usize,
    pub unreadable_rows: usize,
    pub stats: Option<RulStats>,
}

/// Per-subsystem merged rows and KPI values for the session.
///
/// A batch replaces its subsystem's rows wholesale; a single prediction
/// replaces its subsystem's KPI. Neither touches the other subsystems.
#[derive(Debug, Clone, Default)]
pub struct AggregationStore {
    engine: SubsystemAggregate,
    hydraulics: SubsystemAggregate,
    landing_gear: SubsystemAggregate,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subsystem: Subsystem) -> &SubsystemAggregate {
        match subsystem {
            Subsystem::Engine => &self.engine,
            Subsystem::Hydraulics => &self.hydraulics,
            Subsystem::LandingGear => &self.landing_gear,
        }
    }

    fn get_mut(&mut self, subsystem: Subsystem) -> &mut SubsystemAggregate {
        match subsystem {
            Subsystem::Engine => &mut self.engine,
            Subsystem::Hydraulics => &mut self.hydraulics,
            Subsystem::LandingGear => &mut self.landing_gear,
        }
    }

    pub fn replace_rows(&mut self, subsystem: Subsystem, rows: Vec<MergedRow>) {
        self.get_mut(subsystem).rows = rows;
    }

    pub fn set_kpi(&mut self, subsystem: Subsystem, result: &PredictionResult) {
        self.get_mut(subsystem).kpi = Some(Kpi::from(result));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subsystem, &SubsystemAggregate)> {
        Subsystem::ALL
            .into_iter()
            .map(move |subsystem| (subsystem, self.get(subsystem)))
    }

    pub fn summary(&self) -> Vec<SubsystemSummary> {
        self.iter()
            .map(|(subsystem, aggregate)| SubsystemSummary {
                subsystem,
                kpi: aggregate.kpi_display(),
                row_count: aggregate.rows.len(),
                unreadable_rows: aggregate.rows.iter().filter(|row| row.error.is_some()).count(),
                stats: aggregate.rul_stats(),
            })
            .collect()
    }
}
