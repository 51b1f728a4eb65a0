use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tavolo_core::{DomainError, DomainResult, Entity, ProductId};

/// A menu product.
///
/// `price` is in the smallest currency unit (e.g., cents). Orders snapshot
/// this price at submission time, so editing a product never rewrites
/// historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub category: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or fully updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub category: String,
    pub is_available: bool,
}

impl ProductDraft {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name: must not be empty"));
        }
        if self.name.chars().count() > 255 {
            return Err(DomainError::validation("name: must be at most 255 characters"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category: must not be empty"));
        }
        Ok(())
    }
}

impl Product {
    /// Build a new product from a validated draft.
    pub fn new(id: ProductId, draft: ProductDraft, created_at: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            category: draft.category,
            is_available: draft.is_available,
            created_at,
        })
    }

    /// Full-field update (the edit form always submits every field).
    pub fn apply(&mut self, draft: ProductDraft) -> DomainResult<()> {
        draft.validate()?;
        self.name = draft.name;
        self.description = draft.description;
        self.price = draft.price;
        self.category = draft.category;
        self.is_available = draft.is_available;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
