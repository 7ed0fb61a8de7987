use rulcore::pipeline::Pipeline;
use rulcore::store::SubsystemSummary;
use rulcore::telemetry::MetricsSnapshot;
use serde::Serialize;

/// Everything the dashboard view shows, in one serializable snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardModel {
    pub subsystems: Vec<SubsystemSummary>,
    pub metrics: MetricsSnapshot,
}

impl DashboardModel {
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        Self {
            subsystems: pipeline.store().summary(),
            metrics: pipeline.metrics(),
        }
    }
}
