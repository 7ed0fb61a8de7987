pub mod stats;

pub use stats::{RulStats, StatsHelper};
