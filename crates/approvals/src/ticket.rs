use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareops_core::{DocumentId, DomainError, DomainResult, Entity, InventoryItemId, TicketId, UserId};

/// Kind of stock movement a ticket requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    #[serde(rename = "SALES")]
    Sales,
    #[serde(rename = "WRITE-OFF")]
    WriteOff,
    #[serde(rename = "PRODUCTION")]
    Production,
    /// Sale mirrored from the external accounting system.
    #[serde(rename = "1C-SALES")]
    ExternalSales,
}

impl TicketType {
    pub const ALL: [TicketType; 4] = [
        TicketType::Sales,
        TicketType::WriteOff,
        TicketType::Production,
        TicketType::ExternalSales,
    ];

    /// Wire spelling, also used as the path segment of list queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Sales => "SALES",
            TicketType::WriteOff => "WRITE-OFF",
            TicketType::Production => "PRODUCTION",
            TicketType::ExternalSales => "1C-SALES",
        }
    }

    /// Only write-offs are executed after approval.
    pub fn completes(&self) -> bool {
        matches!(self, TicketType::WriteOff)
    }
}

impl core::fmt::Display for TicketType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Active,
    Allowed,
    Completed,
}

/// The source document a ticket was raised from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    pub document: Document,
    pub inventory_item_id: InventoryItemId,
    pub quantity: f64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
    #[serde(default)]
    pub managed_at: Option<DateTime<Utc>>,
}

impl Entity for Ticket {
    type Id = TicketId;

    fn id(&self) -> TicketId {
        self.id
    }
}

impl Ticket {
    pub fn document_id(&self) -> DocumentId {
        self.document.id
    }

    pub fn ensure_approvable(&self) -> DomainResult<()> {
        if self.status == TicketStatus::Active {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "ticket {} is {:?}; only active tickets can be approved",
                self.id, self.status
            )))
        }
    }

    /// `ACTIVE → ALLOWED`, stamping the approver.
    pub fn approve(&mut self, approver: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_approvable()?;
        self.status = TicketStatus::Allowed;
        self.manager_id = Some(approver);
        self.managed_at = Some(at);
        Ok(())
    }

    /// `ALLOWED → COMPLETED`; write-offs only.
    pub fn complete(&mut self) -> DomainResult<()> {
        if !self.ticket_type.completes() {
            return Err(DomainError::invariant(format!(
                "{} tickets are never executed",
                self.ticket_type
            )));
        }
        if self.status != TicketStatus::Allowed {
            return Err(DomainError::invariant(format!(
                "ticket {} must be approved before it is executed",
                self.id
            )));
        }
        self.status = TicketStatus::Completed;
        Ok(())
    }

    pub fn ensure_cancellable(&self) -> DomainResult<()> {
        if self.status == TicketStatus::Completed {
            Err(DomainError::invariant(format!(
                "ticket {} is completed and cannot be cancelled",
                self.id
            )))
        } else {
            Ok(())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::ticket;
    use super::*;

    #[test]
    fn approve_stamps_manager_and_time() {
        let mut t = ticket(1, 1, TicketType::Sales, TicketStatus::Active);
        let at = Utc::now();
        t.approve(UserId::new(42), at).unwrap();
        assert_eq!(t.status, TicketStatus::Allowed);
        assert_eq!(t.manager_id, Some(UserId::new(42)));
        assert_eq!(t.managed_at, Some(at));
        assert!(t.approve(UserId::new(42), at).is_err());
    }

    #[test]
    fn only_approved_write_offs_complete() {
        let mut sale = ticket(1, 1, TicketType::Sales, TicketStatus::Allowed);
        assert!(sale.complete().is_err());

        let mut write_off = ticket(2, 1, TicketType::WriteOff, TicketStatus::Active);
        assert!(write_off.complete().is_err());
        write_off.approve(UserId::new(1), Utc::now()).unwrap();
        write_off.complete().unwrap();
        assert_eq!(write_off.status, TicketStatus::Completed);
        assert!(write_off.ensure_cancellable().is_err());
    }

    #[test]
    fn deserializes_wire_ticket() {
        let t: Ticket = serde_json::from_str(
            r#"{
                "id": 5, "type": "1C-SALES", "status": "ALLOWED",
                "document": {"id": 9, "number": "INV-9"},
                "inventoryItemId": 3, "quantity": 2, "createdBy": 4,
                "createdAt": "2024-05-01T10:00:00Z", "managerId": 8,
                "managedAt": "2024-05-02T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(t.ticket_type, TicketType::ExternalSales);
        assert_eq!(t.status, TicketStatus::Allowed);
        assert_eq!(t.document_id(), DocumentId::new(9));
        assert_eq!(t.manager_id, Some(UserId::new(8)));
    }
}
