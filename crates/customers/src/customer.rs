use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tavolo_core::{CustomerId, DomainError, DomainResult, Entity};

/// A customer record, referenced by orders for attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or fully updating a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl CustomerDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name: must not be empty"));
        }
        if self.name.chars().count() > 255 {
            return Err(DomainError::validation("name: must be at most 255 characters"));
        }
        // Light-weight address check; real deliverability is out of scope.
        if !self.email.contains('@') || self.email.trim().is_empty() {
            return Err(DomainError::validation("email: must be a valid email address"));
        }
        Ok(())
    }
}

impl Customer {
    pub fn new(id: CustomerId, draft: CustomerDraft, created_at: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            address: draft.address,
            city: draft.city,
            created_at,
        })
    }

    /// Full-field update (the edit form always submits every field).
    pub fn apply(&mut self, draft: CustomerDraft) -> DomainResult<()> {
        draft.validate()?;
        self.name = draft.name;
        self.email = draft.email;
        self.phone = draft.phone;
        self.address = draft.address;
        self.city = draft.city;
        Ok(())
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CustomerDraft {
        CustomerDraft {
            name: "Jane Cooper".to_string(),
            email: "jane@example.com".to_string(),
            phone: "0719876543".to_string(),
            address: "456 Crust Road".to_string(),
            city: "Kandy".to_string(),
        }
    }

    #[test]
    fn new_customer_carries_draft_fields() {
        let id = CustomerId::new();
        let customer = Customer::new(id, draft(), Utc::now()).unwrap();
        assert_eq!(customer.id, id);
        assert_eq!(customer.email, "jane@example.com");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut d = draft();
        d.name = String::new();
        assert!(d.validate().is_err());
    }

    #[test]
    fn mail_without_at_sign_is_rejected() {
        let mut d = draft();
        d.email = "jane.example.com".to_string();
        let err = d.validate().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.starts_with("email:")),
            _ => panic!("expected Validation"),
        }
    }

    #[test]
    fn apply_replaces_contact_fields() {
        let mut customer = Customer::new(CustomerId::new(), draft(), Utc::now()).unwrap();
        let mut update = draft();
        update.city = "Colombo".to_string();
        update.phone = "0771234567".to_string();
        customer.apply(update).unwrap();
        assert_eq!(customer.city, "Colombo");
        assert_eq!(customer.phone, "0771234567");
    }
}
