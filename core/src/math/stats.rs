use serde::Serialize;

/// Spread of predicted RUL values across one merged batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RulStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// `None` for an empty slice.
    pub fn summarize(values: &[f64]) -> Option<RulStats> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(RulStats {
            count: values.len(),
            mean: Self::mean(values),
            min,
            max,
        })
    }
}
