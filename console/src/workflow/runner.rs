use crate::report::model::DashboardModel;
use crate::report::render::{render_prediction, render_rows, render_summary};
use crate::workflow::config::ConsoleConfig;
use anyhow::{bail, Context};
use rulcore::client::{PredictionClient, PredictionService};
use rulcore::ingest::{RawValue, Record};
use rulcore::pipeline::{dispatch_batch, dispatch_single, Dispatch, Outcome, Pipeline};
use rulcore::prelude::RequestKind;
use rulcore::{PipelineResult, Subsystem};
use std::fs;
use std::future::Future;
use std::path::Path;

/// Form record for a single prediction: the subsystem's default values with
/// `FIELD=VALUE` overrides applied. Values stay raw until sanitized.
pub fn form_record(subsystem: Subsystem, overrides: &[String]) -> anyhow::Result<Record> {
    let schema = subsystem.schema();
    let mut values: Vec<(&str, RawValue)> = schema
        .fields
        .iter()
        .map(|spec| (spec.name, RawValue::Number(spec.default)))
        .collect();

    for pair in overrides {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("expected FIELD=VALUE, got '{pair}'");
        };
        let name = name.trim();
        let Some(slot) = values.iter_mut().find(|(field, _)| *field == name) else {
            let known: Vec<&str> = subsystem.required_columns().collect();
            bail!(
                "{subsystem} has no field '{name}' (fields: {})",
                known.join(", ")
            );
        };
        slot.1 = RawValue::Text(value.to_string());
    }

    Ok(Record::from_pairs(values))
}

/// Drives the pipeline for the console commands and renders their output.
///
/// `interrupt` abandons a pending request: the call stops waiting and any
/// late result is dropped by the pipeline's ticket check.
pub struct Runner<S = PredictionClient> {
    service: S,
    pipeline: Pipeline,
}

impl Runner<PredictionClient> {
    pub fn from_config(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let client = PredictionClient::new(&config.base_url, config.timeout())
            .context("building prediction client")?;
        Ok(Self::new(client))
    }

    pub fn base_url(&self) -> &str {
        self.service.base_url()
    }

    pub async fn health(&self) -> anyhow::Result<String> {
        let status = self
            .service
            .health()
            .await
            .with_context(|| format!("checking {}", self.service.base_url()))?;
        Ok(format!(
            "service {}: {} (version {})",
            self.service.base_url(),
            status.status,
            status.version.as_deref().unwrap_or("unknown")
        ))
    }
}

impl<S: PredictionService> Runner<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            pipeline: Pipeline::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn predict<I>(
        &mut self,
        subsystem: Subsystem,
        overrides: &[String],
        interrupt: I,
    ) -> anyhow::Result<String>
    where
        I: Future<Output = ()>,
    {
        let record = form_record(subsystem, overrides)?;
        let prepared = self.pipeline.prepare_single(subsystem, &record)?;
        let dispatch = tokio::select! {
            dispatch = dispatch_single(&self.service, &prepared) => dispatch,
            _ = interrupt => {
                self.pipeline.abandon(subsystem, RequestKind::Single);
                Dispatch::Abandoned
            }
        };
        Ok(match self.pipeline.commit_single(prepared, dispatch)? {
            Outcome::Committed(result) => render_prediction(subsystem, &result),
            Outcome::Ignored => format!("{} prediction abandoned", subsystem.label()),
        })
    }

    pub async fn batch<I>(
        &mut self,
        subsystem: Subsystem,
        path: &Path,
        interrupt: I,
    ) -> anyhow::Result<String>
    where
        I: Future<Output = ()>,
    {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading batch file {}", path.display()))?;
        match self.batch_text(subsystem, &text, interrupt).await? {
            Outcome::Committed(_) => self.rows(subsystem),
            Outcome::Ignored => Ok(format!("{} batch abandoned", subsystem.label())),
        }
    }

    async fn batch_text<I>(
        &mut self,
        subsystem: Subsystem,
        text: &str,
        interrupt: I,
    ) -> PipelineResult<Outcome<usize>>
    where
        I: Future<Output = ()>,
    {
        let prepared = self.pipeline.prepare_batch(subsystem, text)?;
        let dispatch = tokio::select! {
            dispatch = dispatch_batch(&self.service, &prepared) => dispatch,
            _ = interrupt => {
                self.pipeline.abandon(subsystem, RequestKind::Batch);
                Dispatch::Abandoned
            }
        };
        self.pipeline.commit_batch(prepared, dispatch)
    }

    pub fn rows(&self, subsystem: Subsystem) -> anyhow::Result<String> {
        render_rows(subsystem, self.pipeline.store().get(subsystem).rows())
    }

    pub fn rows_json(&self, subsystem: Subsystem) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self.pipeline.store().get(subsystem).rows())
            .context("serializing merged rows")
    }

    pub fn summary(&self) -> String {
        render_summary(&DashboardModel::from_pipeline(&self.pipeline))
    }
}
