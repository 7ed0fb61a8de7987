use serde::Serialize;

/// Session counters for submissions, split by how they ended.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: MetricsSnapshot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Results written to the store.
    pub committed: usize,
    /// Parse, schema, request, or merge failures.
    pub failed: usize,
    /// Responses that arrived for an abandoned request.
    pub ignored: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_committed(&mut self) {
        self.inner.committed += 1;
    }

    pub fn record_failed(&mut self) {
        self.inner.failed += 1;
    }

    pub fn record_ignored(&mut self) {
        self.inner.ignored += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let mut metrics = MetricsRecorder::new();
        metrics.record_committed();
        metrics.record_committed();
        metrics.record_ignored();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                committed: 2,
                failed: 0,
                ignored: 1
            }
        );
    }
}
