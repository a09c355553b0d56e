//! Document grouping: a derived view, never stored.

use std::collections::HashMap;

use serde::Serialize;

use wareops_core::{DocumentId, TicketId};

use crate::ticket::{Document, Ticket, TicketStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentGroup {
    pub document: Document,
    pub tickets: Vec<Ticket>,
}

impl DocumentGroup {
    pub fn document_id(&self) -> DocumentId {
        self.document.id
    }

    pub fn has_status(&self, status: TicketStatus) -> bool {
        self.tickets.iter().any(|t| t.status == status)
    }

    pub fn is_active(&self) -> bool {
        self.has_status(TicketStatus::Active)
    }

    pub fn is_allowed(&self) -> bool {
        self.has_status(TicketStatus::Allowed)
    }

    pub fn is_completed(&self) -> bool {
        self.has_status(TicketStatus::Completed)
    }

    /// The tickets a batch approval would target.
    pub fn active_ticket_ids(&self) -> Vec<TicketId> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Active)
            .map(|t| t.id)
            .collect()
    }
}

/// Group tickets by `document.id`, in order of first appearance.
pub fn group_by_document<'a, I>(tickets: I) -> Vec<DocumentGroup>
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut position: HashMap<DocumentId, usize> = HashMap::new();
    let mut groups: Vec<DocumentGroup> = Vec::new();
    for ticket in tickets {
        match position.get(&ticket.document.id) {
            Some(&idx) => groups[idx].tickets.push(ticket.clone()),
            None => {
                position.insert(ticket.document.id, groups.len());
                groups.push(DocumentGroup {
                    document: ticket.document.clone(),
                    tickets: vec![ticket.clone()],
                });
            }
        }
    }
    groups
}

/// Status bucket: every group holding at least one ticket in `status`. A
/// group can appear in several buckets.
pub fn groups_with_status(groups: &[DocumentGroup], status: TicketStatus) -> Vec<&DocumentGroup> {
    groups.iter().filter(|g| g.has_status(status)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::fixtures::ticket;
    use crate::ticket::TicketType;

    #[test]
    fn groups_keep_first_appearance_order() {
        let tickets = vec![
            ticket(1, 20, TicketType::Sales, TicketStatus::Active),
            ticket(2, 10, TicketType::Sales, TicketStatus::Active),
            ticket(3, 20, TicketType::Sales, TicketStatus::Allowed),
        ];
        let groups = group_by_document(&tickets);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].document_id(), DocumentId::new(20));
        assert_eq!(groups[0].tickets.len(), 2);
        assert_eq!(groups[0].active_ticket_ids(), vec![TicketId::new(1)]);
    }

    #[test]
    fn a_group_can_sit_in_several_buckets() {
        let tickets = vec![
            ticket(1, 7, TicketType::WriteOff, TicketStatus::Active),
            ticket(2, 7, TicketType::WriteOff, TicketStatus::Allowed),
            ticket(3, 7, TicketType::WriteOff, TicketStatus::Completed),
            ticket(4, 8, TicketType::Sales, TicketStatus::Allowed),
        ];
        let groups = group_by_document(&tickets);
        assert_eq!(groups_with_status(&groups, TicketStatus::Active).len(), 1);
        assert_eq!(groups_with_status(&groups, TicketStatus::Allowed).len(), 2);
        assert_eq!(groups_with_status(&groups, TicketStatus::Completed).len(), 1);
        assert!(groups[0].is_active() && groups[0].is_allowed() && groups[0].is_completed());
    }
}
