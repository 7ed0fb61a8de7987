use crate::schema::Subsystem;
use log::{info, warn};

/// Subsystem-scoped log lines for pipeline outcomes.
pub struct LogManager {
    subsystem: Subsystem,
}

impl LogManager {
    pub fn new(subsystem: Subsystem) -> Self {
        Self { subsystem }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.subsystem, message);
    }

    pub fn reject(&self, message: &str) {
        warn!("[{}] {}", self.subsystem, message);
    }
}
