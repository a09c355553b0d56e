//! Ticket approvals: loads tickets per type and applies transitions
//! optimistically, restoring the affected tickets when the server refuses.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use wareops_approvals::{ApprovalLedger, DocumentGroup, Ticket, TicketStatus, TicketType};
use wareops_auth::Capability;
use wareops_core::{DateRange, DocumentId, DomainError, TicketId};

use crate::context::SessionHandle;
use crate::error::{ClientError, ClientResult};
use crate::inflight::InFlight;
use crate::lock;

#[derive(Debug, Default)]
struct ApprovalState {
    /// Bumped whenever a reload replaces tickets; a rollback captured before
    /// the bump is dropped.
    revision: u64,
    ledger: ApprovalLedger,
}

/// Tickets captured before an optimistic change, with the revision they
/// belong to.
struct Snapshot {
    revision: u64,
    tickets: Vec<Ticket>,
}

#[derive(Clone)]
pub struct ApprovalService {
    session: SessionHandle,
    state: Arc<Mutex<ApprovalState>>,
    documents: InFlight<DocumentId>,
    tickets: InFlight<TicketId>,
}

impl ApprovalService {
    pub(crate) fn new(session: SessionHandle) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(ApprovalState::default())),
            documents: InFlight::new("batch approval"),
            tickets: InFlight::new("ticket transition"),
        }
    }

    /// Reload one ticket type for `range` and return its document groups.
    ///
    /// Re-issuing for the same type supersedes the earlier request; the
    /// earlier caller gets `Stale` and nothing is applied.
    #[tracing::instrument(skip(self), fields(ticket_type = %ticket_type))]
    pub async fn refresh(&self, ticket_type: TicketType, range: DateRange) -> ClientResult<Vec<DocumentGroup>> {
        self.session.require(Capability::ViewTickets)?;
        let api = Arc::clone(&self.session.api);
        let tickets = self
            .session
            .latest
            .run(format!("tickets.{ticket_type}"), async move {
                api.tickets(ticket_type, range).await
            })
            .await?;

        let count = tickets.len();
        let mut state = lock(&self.state);
        state.revision += 1;
        state.ledger.replace_tickets(ticket_type, tickets);
        tracing::info!(tickets = count, "tickets loaded");
        Ok(state.ledger.groups_of(ticket_type))
    }

    pub fn groups(&self, ticket_type: TicketType) -> Vec<DocumentGroup> {
        self.read(|l| l.groups_of(ticket_type))
    }

    /// Groups of `ticket_type` with at least one ticket in `status`.
    pub fn bucket(&self, ticket_type: TicketType, status: TicketStatus) -> Vec<DocumentGroup> {
        self.read(|l| l.bucket(ticket_type, status))
    }

    pub fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.read(|l| l.get(id).cloned())
    }

    #[tracing::instrument(skip(self), fields(ticket_id = %id))]
    pub async fn approve(&self, id: TicketId) -> ClientResult<()> {
        self.session.require(Capability::ApproveTickets)?;
        let approver = self.session.user_id();
        let _guard = self.tickets.try_acquire(id)?;
        let snapshot = {
            let mut state = lock(&self.state);
            let snapshot = state.snapshot(&[id]);
            state.ledger.approve(id, approver, Utc::now())?;
            snapshot
        };

        let result = self.session.api.approve_ticket(id, approver).await;
        self.settle(snapshot, "approve ticket", result)?;
        tracing::info!("ticket approved");
        Ok(())
    }

    /// Approve every `ACTIVE` ticket of a document in one request.
    #[tracing::instrument(skip(self), fields(document_id = %document))]
    pub async fn approve_document(&self, document: DocumentId) -> ClientResult<Vec<TicketId>> {
        let ids = self.read(|l| l.batch_candidates(document));
        if ids.is_empty() {
            return Err(DomainError::validation(format!(
                "document {document} has no tickets awaiting approval"
            ))
            .into());
        }
        self.approve_batch(&ids).await?;
        Ok(ids)
    }

    /// All listed tickets move to `ALLOWED`, or none do. Repeated ids count
    /// once.
    ///
    /// A failure restores every ticket. A reply that approved only some of
    /// them also restores every ticket and returns `ResyncRequired`: the
    /// caller must reload the type to see the server's state.
    #[tracing::instrument(skip(self))]
    pub async fn approve_batch(&self, ids: &[TicketId]) -> ClientResult<()> {
        self.session.require(Capability::ApproveTickets)?;
        let approver = self.session.user_id();
        let (ids, snapshot, _guard) = {
            let mut state = lock(&self.state);
            let documents: BTreeSet<DocumentId> = ids
                .iter()
                .filter_map(|id| state.ledger.get(*id).map(Ticket::document_id))
                .collect();
            let guard = self.documents.try_acquire_all(documents.into_iter().collect())?;
            let snapshot = state.snapshot(ids);
            match state.ledger.approve_batch(ids, approver, Utc::now()) {
                Ok(unique) => (unique, snapshot, guard),
                Err(err) => {
                    state.ledger.restore(snapshot.tickets);
                    return Err(err.into());
                }
            }
        };

        let result = self.session.api.approve_batch(&ids, approver).await;
        let revision = snapshot.revision;
        let tickets = snapshot.tickets.clone();
        let reply = self.settle(snapshot, "approve batch", result)?;
        if reply.is_partial() {
            let mut state = lock(&self.state);
            if state.revision == revision {
                state.ledger.restore(tickets);
            }
            tracing::warn!(
                approved = reply.approved_ids.len(),
                rejected = reply.rejected_ids.len(),
                "batch approval only partly applied"
            );
            return Err(ClientError::ResyncRequired(format!(
                "{} of {} tickets were not approved",
                reply.rejected_ids.len(),
                ids.len()
            )));
        }
        tracing::info!(tickets = ids.len(), "batch approved");
        Ok(())
    }

    /// Remove a ticket that has not been completed.
    #[tracing::instrument(skip(self), fields(ticket_id = %id))]
    pub async fn cancel(&self, id: TicketId) -> ClientResult<()> {
        self.session.require(Capability::ApproveTickets)?;
        let _guard = self.tickets.try_acquire(id)?;
        let snapshot = {
            let mut state = lock(&self.state);
            let removed = state.ledger.cancel(id)?;
            Snapshot {
                revision: state.revision,
                tickets: vec![removed],
            }
        };

        let result = self.session.api.cancel_ticket(id).await;
        self.settle(snapshot, "cancel ticket", result)?;
        tracing::info!("ticket cancelled");
        Ok(())
    }

    /// Execute an approved write-off.
    #[tracing::instrument(skip(self), fields(ticket_id = %id))]
    pub async fn execute_write_off(&self, id: TicketId) -> ClientResult<()> {
        self.session.require(Capability::ExecuteWriteOffs)?;
        let _guard = self.tickets.try_acquire(id)?;
        let snapshot = {
            let mut state = lock(&self.state);
            let snapshot = state.snapshot(&[id]);
            state.ledger.complete(id)?;
            snapshot
        };

        let result = self.session.api.execute_write_off(id).await;
        self.settle(snapshot, "execute write-off", result)?;
        tracing::info!("write-off executed");
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&ApprovalLedger) -> R) -> R {
        f(&lock(&self.state).ledger)
    }

    /// Roll back on failure unless a reload has replaced the tickets since
    /// `snapshot` was taken.
    fn settle<T>(&self, snapshot: Snapshot, what: &str, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            let mut state = lock(&self.state);
            if state.revision == snapshot.revision {
                state.ledger.restore(snapshot.tickets);
                tracing::warn!(operation = what, error = %err, "ticket change rejected; restored");
            } else {
                tracing::warn!(operation = what, error = %err, "ticket change rejected after a reload; keeping reloaded state");
            }
        }
        result
    }
}

impl ApprovalState {
    fn snapshot(&self, ids: &[TicketId]) -> Snapshot {
        Snapshot {
            revision: self.revision,
            tickets: self.ledger.snapshot(ids),
        }
    }
}
