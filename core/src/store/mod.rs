pub mod aggregate;

pub use aggregate::{format_rul, AggregationStore, Kpi, SubsystemAggregate, SubsystemSummary, KPI_PLACEHOLDER};
