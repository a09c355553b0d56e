//! Local ticket store with the approval state machine applied on top.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use wareops_core::{DocumentId, DomainError, DomainResult, TicketId, UserId, index_by_id};

use crate::grouping::{group_by_document, groups_with_status, DocumentGroup};
use crate::ticket::{Ticket, TicketStatus, TicketType};

/// Tickets known to the client, keyed by id.
///
/// `Clone` is the snapshot mechanism: callers that edit optimistically keep a
/// clone and restore it when the server rejects the change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalLedger {
    tickets: BTreeMap<TicketId, Ticket>,
}

impl ApprovalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tickets(tickets: impl IntoIterator<Item = Ticket>) -> Self {
        Self {
            tickets: index_by_id(tickets),
        }
    }

    /// Swap every ticket of `ticket_type` for a freshly loaded list.
    pub fn replace_tickets(&mut self, ticket_type: TicketType, tickets: Vec<Ticket>) {
        self.tickets.retain(|_, t| t.ticket_type != ticket_type);
        for ticket in tickets {
            if ticket.ticket_type != ticket_type {
                tracing::warn!(
                    ticket_id = %ticket.id,
                    expected = %ticket_type,
                    actual = %ticket.ticket_type,
                    "ticket listed under the wrong type"
                );
            }
            self.tickets.insert(ticket.id, ticket);
        }
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn get(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&id)
    }

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values()
    }

    pub fn tickets_of(&self, ticket_type: TicketType) -> impl Iterator<Item = &Ticket> {
        self.tickets.values().filter(move |t| t.ticket_type == ticket_type)
    }

    /// Copies of the listed tickets, for restoring after a rejected call.
    pub fn snapshot(&self, ids: &[TicketId]) -> Vec<Ticket> {
        ids.iter().filter_map(|id| self.tickets.get(id).cloned()).collect()
    }

    /// Put tickets back exactly as they were captured.
    pub fn restore(&mut self, tickets: Vec<Ticket>) {
        for ticket in tickets {
            self.tickets.insert(ticket.id, ticket);
        }
    }

    fn ticket_mut(&mut self, id: TicketId) -> DomainResult<&mut Ticket> {
        self.tickets
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("ticket {id}")))
    }

    pub fn approve(&mut self, id: TicketId, approver: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        self.ticket_mut(id)?.approve(approver, at)
    }

    /// Approve every listed ticket or none of them.
    ///
    /// Repeated ids count once. All tickets are checked before the first one
    /// changes, so a failure leaves the ledger untouched. Returns the distinct
    /// ids in ascending order.
    pub fn approve_batch(
        &mut self,
        ids: &[TicketId],
        approver: UserId,
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<TicketId>> {
        let unique: BTreeSet<TicketId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Err(DomainError::validation("batch approval needs at least one ticket"));
        }
        for id in &unique {
            let ticket = self
                .tickets
                .get(id)
                .ok_or_else(|| DomainError::not_found(format!("ticket {id}")))?;
            ticket.ensure_approvable()?;
        }
        for id in &unique {
            self.ticket_mut(*id)?.approve(approver, at)?;
        }
        Ok(unique.into_iter().collect())
    }

    /// Active tickets of one document, the target set of a batch approval.
    pub fn batch_candidates(&self, document_id: DocumentId) -> Vec<TicketId> {
        self.tickets
            .values()
            .filter(|t| t.document.id == document_id && t.status == TicketStatus::Active)
            .map(|t| t.id)
            .collect()
    }

    /// Drop a ticket that is not yet completed.
    pub fn cancel(&mut self, id: TicketId) -> DomainResult<Ticket> {
        self.ticket_mut(id)?.ensure_cancellable()?;
        self.tickets
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("ticket {id}")))
    }

    pub fn complete(&mut self, id: TicketId) -> DomainResult<()> {
        self.ticket_mut(id)?.complete()
    }

    pub fn groups(&self) -> Vec<DocumentGroup> {
        group_by_document(self.tickets.values())
    }

    pub fn groups_of(&self, ticket_type: TicketType) -> Vec<DocumentGroup> {
        group_by_document(self.tickets_of(ticket_type))
    }

    /// Groups of one type holding at least one ticket in `status`.
    pub fn bucket(&self, ticket_type: TicketType, status: TicketStatus) -> Vec<DocumentGroup> {
        let groups = self.groups_of(ticket_type);
        groups_with_status(&groups, status).into_iter().cloned().collect()
    }
}
