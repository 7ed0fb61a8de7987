use crate::client::{BatchResponse, PredictionResult, PredictionService};
use crate::ingest::{parse_str, Record};
use crate::pipeline::guard::{PanelState, Ticket};
use crate::prelude::{PipelineError, PipelineResult, RequestError, RequestKind};
use crate::processing::{merge_batch, sanitize_record, sanitize_records, SanitizedPayload};
use crate::schema::{validate_headers, Subsystem};
use crate::store::{format_rul, AggregationStore};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};

/// Batch that passed parsing, validation, and sanitization and now holds
/// its panel's in-flight slot.
#[derive(Debug)]
pub struct PreparedBatch {
    ticket: Ticket,
    records: Vec<Record>,
    payloads: Vec<SanitizedPayload>,
}

impl PreparedBatch {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn payloads(&self) -> &[SanitizedPayload] {
        &self.payloads
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
pub struct PreparedSingle {
    ticket: Ticket,
    payload: SanitizedPayload,
}

impl PreparedSingle {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn payload(&self) -> &SanitizedPayload {
        &self.payload
    }
}

/// How a network call ended from the requester's side.
#[derive(Debug)]
pub enum Dispatch<T> {
    Completed(Result<T, RequestError>),
    Abandoned,
}

/// Result of committing a finished request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Committed(T),
    /// The request was abandoned or superseded; nothing was applied.
    Ignored,
}

/// Sends the batch unless its ticket is cancelled first.
pub async fn dispatch_batch<S: PredictionService>(
    service: &S,
    prepared: &PreparedBatch,
) -> Dispatch<BatchResponse> {
    let token = prepared.ticket.token();
    tokio::select! {
        biased;
        _ = token.cancelled() => Dispatch::Abandoned,
        result = service.predict_batch(prepared.ticket.subsystem(), &prepared.payloads) => {
            Dispatch::Completed(result)
        }
    }
}

pub async fn dispatch_single<S: PredictionService>(
    service: &S,
    prepared: &PreparedSingle,
) -> Dispatch<PredictionResult> {
    let token = prepared.ticket.token();
    tokio::select! {
        biased;
        _ = token.cancelled() => Dispatch::Abandoned,
        result = service.predict_single(prepared.ticket.subsystem(), &prepared.payload) => {
            Dispatch::Completed(result)
        }
    }
}

/// Session state of the console: one store, one panel per subsystem.
///
/// Work is split into a synchronous `prepare_*`, an awaited `dispatch_*`
/// that borrows nothing mutable, and a synchronous `commit_*` that applies
/// the result only if the request is still current.
#[derive(Debug, Default)]
pub struct Pipeline {
    store: AggregationStore,
    engine: PanelState,
    hydraulics: PanelState,
    landing_gear: PanelState,
    metrics: MetricsRecorder,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn panel(&self, subsystem: Subsystem) -> &PanelState {
        match subsystem {
            Subsystem::Engine => &self.engine,
            Subsystem::Hydraulics => &self.hydraulics,
            Subsystem::LandingGear => &self.landing_gear,
        }
    }

    fn panel_mut(&mut self, subsystem: Subsystem) -> &mut PanelState {
        match subsystem {
            Subsystem::Engine => &mut self.engine,
            Subsystem::Hydraulics => &mut self.hydraulics,
            Subsystem::LandingGear => &mut self.landing_gear,
        }
    }

    pub fn is_pending(&self, subsystem: Subsystem, kind: RequestKind) -> bool {
        self.panel(subsystem).guard(kind).is_pending()
    }

    /// Parses, validates, and sanitizes `text` without touching the network.
    pub fn prepare_batch(&mut self, subsystem: Subsystem, text: &str) -> PipelineResult<PreparedBatch> {
        self.ensure_idle(subsystem, RequestKind::Batch)?;
        let log = LogManager::new(subsystem);

        let parsed = parse_str(text)
            .map_err(PipelineError::from)
            .and_then(|parsed| {
                validate_headers(subsystem, &parsed.headers)?;
                Ok(parsed)
            })
            .map_err(|err| self.fail(&log, err))?;

        let payloads = sanitize_records(subsystem.schema(), &parsed.records);
        let ticket = self
            .panel_mut(subsystem)
            .guard_mut(RequestKind::Batch)
            .begin(subsystem, RequestKind::Batch)?;
        log.record(&format!("submitting batch of {} records", payloads.len()));

        Ok(PreparedBatch {
            ticket,
            records: parsed.records,
            payloads,
        })
    }

    pub fn prepare_single(&mut self, subsystem: Subsystem, record: &Record) -> PipelineResult<PreparedSingle> {
        self.ensure_idle(subsystem, RequestKind::Single)?;
        let payload = sanitize_record(subsystem.schema(), record);
        let ticket = self
            .panel_mut(subsystem)
            .guard_mut(RequestKind::Single)
            .begin(subsystem, RequestKind::Single)?;
        Ok(PreparedSingle { ticket, payload })
    }

    /// Merges and stores the batch result. Returns the stored row count.
    ///
    /// On any failure the subsystem's existing rows are left as they were.
    pub fn commit_batch(
        &mut self,
        prepared: PreparedBatch,
        dispatch: Dispatch<BatchResponse>,
    ) -> PipelineResult<Outcome<usize>> {
        let subsystem = prepared.ticket.subsystem();
        let log = LogManager::new(subsystem);
        let Some(result) = self.settle(&prepared.ticket, dispatch) else {
            log.reject("ignoring response for abandoned batch");
            return Ok(Outcome::Ignored);
        };

        let response = result.map_err(|err| self.fail(&log, err.into()))?;
        let rows = merge_batch(prepared.records, response).map_err(|err| self.fail(&log, err.into()))?;
        let count = rows.len();
        self.store.replace_rows(subsystem, rows);
        self.metrics.record_committed();
        log.record(&format!("stored {count} merged rows"));
        Ok(Outcome::Committed(count))
    }

    pub fn commit_single(
        &mut self,
        prepared: PreparedSingle,
        dispatch: Dispatch<PredictionResult>,
    ) -> PipelineResult<Outcome<PredictionResult>> {
        let subsystem = prepared.ticket.subsystem();
        let log = LogManager::new(subsystem);
        let Some(result) = self.settle(&prepared.ticket, dispatch) else {
            log.reject("ignoring response for abandoned prediction");
            return Ok(Outcome::Ignored);
        };

        let prediction = result.map_err(|err| self.fail(&log, err.into()))?;
        self.store.set_kpi(subsystem, &prediction);
        self.metrics.record_committed();
        log.record(&format!("KPI updated to {}", format_rul(prediction.predicted_rul)));
        Ok(Outcome::Committed(prediction))
    }

    /// Abandons the pending request of `kind`, if any, so its eventual
    /// result is ignored. Returns whether a request was pending.
    pub fn abandon(&mut self, subsystem: Subsystem, kind: RequestKind) -> bool {
        self.panel_mut(subsystem).guard_mut(kind).abandon()
    }

    /// Full batch flow against `service`: file text to stored rows.
    pub async fn submit_batch<S: PredictionService>(
        &mut self,
        service: &S,
        subsystem: Subsystem,
        text: &str,
    ) -> PipelineResult<Outcome<usize>> {
        let prepared = self.prepare_batch(subsystem, text)?;
        let dispatch = dispatch_batch(service, &prepared).await;
        self.commit_batch(prepared, dispatch)
    }

    pub async fn submit_single<S: PredictionService>(
        &mut self,
        service: &S,
        subsystem: Subsystem,
        record: &Record,
    ) -> PipelineResult<Outcome<PredictionResult>> {
        let prepared = self.prepare_single(subsystem, record)?;
        let dispatch = dispatch_single(service, &prepared).await;
        self.commit_single(prepared, dispatch)
    }

    fn ensure_idle(&self, subsystem: Subsystem, kind: RequestKind) -> PipelineResult<()> {
        if self.is_pending(subsystem, kind) {
            return Err(PipelineError::Busy { subsystem, kind });
        }
        Ok(())
    }

    /// `None` when the result must be dropped; counts it as ignored.
    fn settle<T>(&mut self, ticket: &Ticket, dispatch: Dispatch<T>) -> Option<Result<T, RequestError>> {
        let current = self
            .panel_mut(ticket.subsystem())
            .guard_mut(ticket.kind())
            .settle(ticket);
        match dispatch {
            Dispatch::Completed(result) if current => Some(result),
            _ => {
                self.metrics.record_ignored();
                None
            }
        }
    }

    fn fail(&mut self, log: &LogManager, err: PipelineError) -> PipelineError {
        self.metrics.record_failed();
        log.reject(&err.to_string());
        err
    }
}
