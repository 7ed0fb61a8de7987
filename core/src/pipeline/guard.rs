use crate::prelude::{PipelineError, RequestKind};
use crate::schema::Subsystem;
use tokio_util::sync::CancellationToken;

/// Proof that a request was started, checked again before its result is applied.
#[derive(Debug, Clone)]
pub struct Ticket {
    subsystem: Subsystem,
    kind: RequestKind,
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn subsystem(&self) -> Subsystem {
        self.subsystem
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Clone of the request's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// At most one in-flight request per panel action.
///
/// Every `begin` or `abandon` moves the generation forward, so a ticket from
/// an earlier request can never settle a later one.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    generation: u64,
    pending: Option<CancellationToken>,
}

impl InFlightGuard {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin(&mut self, subsystem: Subsystem, kind: RequestKind) -> Result<Ticket, PipelineError> {
        if self.is_pending() {
            return Err(PipelineError::Busy { subsystem, kind });
        }
        self.generation += 1;
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        Ok(Ticket {
            subsystem,
            kind,
            generation: self.generation,
            token,
        })
    }

    /// Drops the pending request. Returns `false` when nothing was pending.
    pub fn abandon(&mut self) -> bool {
        match self.pending.take() {
            Some(token) => {
                token.cancel();
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Releases the guard if `ticket` is the current request. Returns `true`
    /// only when its result may be applied, i.e. it is current and was not
    /// cancelled.
    pub fn settle(&mut self, ticket: &Ticket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.pending = None;
        !ticket.is_cancelled()
    }
}

/// Request guards of one subsystem panel.
#[derive(Debug, Default)]
pub struct PanelState {
    pub single: InFlightGuard,
    pub batch: InFlightGuard,
}

impl PanelState {
    pub fn guard_mut(&mut self, kind: RequestKind) -> &mut InFlightGuard {
        match kind {
            RequestKind::Single => &mut self.single,
            RequestKind::Batch => &mut self.batch,
        }
    }

    pub fn guard(&self, kind: RequestKind) -> &InFlightGuard {
        match kind {
            RequestKind::Single => &self.single,
            RequestKind::Batch => &self.batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_while_pending() {
        let mut guard = InFlightGuard::default();
        let ticket = guard.begin(Subsystem::Engine, RequestKind::Batch).unwrap();
        assert!(matches!(
            guard.begin(Subsystem::Engine, RequestKind::Batch),
            Err(PipelineError::Busy { .. })
        ));
        assert!(guard.settle(&ticket));
        assert!(guard.begin(Subsystem::Engine, RequestKind::Batch).is_ok());
    }

    #[test]
    fn abandoned_ticket_is_stale() {
        let mut guard = InFlightGuard::default();
        let old = guard.begin(Subsystem::Hydraulics, RequestKind::Single).unwrap();
        assert!(guard.abandon());
        assert!(old.is_cancelled());
        let fresh = guard.begin(Subsystem::Hydraulics, RequestKind::Single).unwrap();
        assert!(!guard.settle(&old));
        assert!(guard.is_pending());
        assert!(guard.settle(&fresh));
        assert!(!guard.is_pending());
    }

    #[test]
    fn cancelled_current_ticket_frees_the_slot_but_is_not_applied() {
        let mut guard = InFlightGuard::default();
        let ticket = guard.begin(Subsystem::Engine, RequestKind::Single).unwrap();
        ticket.token().cancel();
        assert!(!guard.settle(&ticket));
        assert!(!guard.is_pending());
    }

    #[test]
    fn abandon_without_pending_is_a_no_op() {
        let mut guard = InFlightGuard::default();
        assert!(!guard.abandon());
    }
}
