//! RFQ (request for quotation) records and their lifecycle.
//!
//! Every status change except creation is decided by the commerce backend.
//! The transition table here is what the storefront is allowed to *request*
//! and what it expects to observe; it is never used to fabricate a status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CURRENCY;
use crate::error::RfqError;
use crate::quotation::QuotationVersion;
use crate::types::{QuotationVersionId, RfqId};

pub use crate::quotation::QuoteStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqType {
    Product,
    Service,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    Draft,
    Submitted,
    Quoting,
    Quoted,
    InNegotiation,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl RfqStatus {
    pub const ALL: [RfqStatus; 9] = [
        RfqStatus::Draft,
        RfqStatus::Submitted,
        RfqStatus::Quoting,
        RfqStatus::Quoted,
        RfqStatus::InNegotiation,
        RfqStatus::Accepted,
        RfqStatus::Rejected,
        RfqStatus::Expired,
        RfqStatus::Converted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RfqStatus::Draft => "draft",
            RfqStatus::Submitted => "submitted",
            RfqStatus::Quoting => "quoting",
            RfqStatus::Quoted => "quoted",
            RfqStatus::InNegotiation => "in_negotiation",
            RfqStatus::Accepted => "accepted",
            RfqStatus::Rejected => "rejected",
            RfqStatus::Expired => "expired",
            RfqStatus::Converted => "converted",
        }
    }

    /// Display label used by the storefront pages.
    pub fn label(&self) -> &'static str {
        match self {
            RfqStatus::Draft => "Draft",
            RfqStatus::Submitted => "Submitted",
            RfqStatus::Quoting => "Quoting",
            RfqStatus::Quoted => "Quoted",
            RfqStatus::InNegotiation => "Negotiating",
            RfqStatus::Accepted => "Accepted",
            RfqStatus::Rejected => "Rejected",
            RfqStatus::Expired => "Expired",
            RfqStatus::Converted => "Converted to Order",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RfqStatus::Rejected | RfqStatus::Expired | RfqStatus::Converted
        )
    }

    /// Statuses reachable in one step from `self`.
    pub fn allowed_next(&self) -> &'static [RfqStatus] {
        use RfqStatus::*;
        match self {
            Draft => &[Submitted],
            Submitted => &[Quoting, Rejected, Expired],
            Quoting => &[Quoted, Rejected, Expired],
            Quoted => &[InNegotiation, Accepted, Rejected, Expired],
            InNegotiation => &[Accepted, Rejected, Expired],
            Accepted => &[Converted],
            Rejected | Expired | Converted => &[],
        }
    }

    pub fn can_transition_to(&self, next: RfqStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Whether a buyer may accept a quote while the RFQ is in this status.
    pub fn accepts_quotes(&self) -> bool {
        self.can_transition_to(RfqStatus::Accepted)
    }
}

impl std::fmt::Display for RfqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfqRequest {
    pub id: RfqId,
    pub customer_id: String,
    pub title: String,
    pub description: String,
    pub rfq_type: RfqType,
    pub status: RfqStatus,
    #[serde(default)]
    pub priority: RfqPriority,
    /// Minor currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<i64>,
    /// Minor currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<i64>,
    pub currency_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub quotation_versions: Vec<QuotationVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RfqRequest {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `expires_at` has passed. The backend decides the actual
    /// `expired` transition; this only drives local guards.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn quotation(&self, id: &QuotationVersionId) -> Option<&QuotationVersion> {
        self.quotation_versions.iter().find(|q| &q.id == id)
    }

    /// Fails unless `id` is one of this RFQ's own quotation versions.
    pub fn ensure_owns_quotation(
        &self,
        id: &QuotationVersionId,
    ) -> Result<&QuotationVersion, RfqError> {
        self.quotation(id)
            .filter(|q| q.rfq_request_id == self.id)
            .ok_or_else(|| RfqError::ForeignQuotation {
                rfq: self.id.clone(),
                quotation: id.clone(),
            })
    }

    pub fn ensure_mutable(&self) -> Result<(), RfqError> {
        if self.is_terminal() {
            return Err(RfqError::ReadOnly {
                id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Checks the record-level invariants (budget ordering).
    pub fn validate(&self) -> Result<(), RfqError> {
        check_budget(self.budget_min, self.budget_max)
    }
}

/// Buyer form submission. Becomes `submitted` once the backend accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRfqRequest {
    pub title: String,
    pub description: String,
    pub rfq_type: RfqType,
    #[serde(default)]
    pub priority: RfqPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl NewRfqRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>, rfq_type: RfqType) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            rfq_type,
            priority: RfqPriority::default(),
            budget_min: None,
            budget_max: None,
            currency_code: default_currency(),
            quantity: None,
            unit: None,
            deadline: None,
            requirements: None,
        }
    }

    pub fn with_budget(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.budget_min = min;
        self.budget_max = max;
        self
    }

    pub fn validate(&self) -> Result<(), RfqError> {
        if self.title.trim().is_empty() {
            return Err(RfqError::MissingField { field: "title" });
        }
        if self.description.trim().is_empty() {
            return Err(RfqError::MissingField {
                field: "description",
            });
        }
        if self.currency_code.trim().is_empty() {
            return Err(RfqError::MissingField {
                field: "currency_code",
            });
        }
        if let Some(q) = self.quantity {
            if q.is_nan() || q <= 0.0 {
                return Err(RfqError::InvalidQuantity);
            }
        }
        check_budget(self.budget_min, self.budget_max)
    }
}

/// Partial update of an open RFQ.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RfqUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<RfqPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl RfqUpdate {
    /// Validates the update as it would apply on top of `current`.
    pub fn validate_against(&self, current: &RfqRequest) -> Result<(), RfqError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(RfqError::MissingField { field: "title" });
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(RfqError::MissingField {
                field: "description",
            });
        }
        check_budget(
            self.budget_min.or(current.budget_min),
            self.budget_max.or(current.budget_max),
        )
    }
}

fn check_budget(min: Option<i64>, max: Option<i64>) -> Result<(), RfqError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(RfqError::BudgetRange { min, max }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Pending,
    Held,
    PartiallyReleased,
    Released,
    Refunded,
    Disputed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowType {
    Product,
    Service,
}

/// Held-funds record for an order derived from an accepted quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowTransaction {
    pub id: String,
    pub order_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    pub status: EscrowStatus,
    pub escrow_type: EscrowType,
    pub total_amount: i64,
    pub held_amount: i64,
    pub released_amount: i64,
    pub refunded_amount: i64,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EscrowTransaction {
    /// Amount not yet held, released or refunded. `None` when the amounts
    /// do not fit in an `i64`.
    pub fn unallocated(&self) -> Option<i64> {
        self.total_amount
            .checked_sub(self.held_amount)?
            .checked_sub(self.released_amount)?
            .checked_sub(self.refunded_amount)
    }

    pub fn is_consistent(&self) -> bool {
        self.held_amount >= 0
            && self.released_amount >= 0
            && self.refunded_amount >= 0
            && self.unallocated().is_some_and(|rest| rest >= 0)
    }
}
