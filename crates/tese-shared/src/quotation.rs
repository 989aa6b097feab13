//! Seller quotations. A version is never edited: a counter-offer produces a
//! new version whose `parent_version_id` points at the one it supersedes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RfqError;
use crate::types::{QuotationVersionId, RfqId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Viewed,
    InNegotiation,
    Accepted,
    Rejected,
    Expired,
    ConvertedToOrder,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Viewed => "viewed",
            QuoteStatus::InNegotiation => "in_negotiation",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
            QuoteStatus::ConvertedToOrder => "converted_to_order",
        }
    }

    /// A buyer can act on (accept or negotiate) a quote in these states.
    pub fn is_open_offer(&self) -> bool {
        matches!(
            self,
            QuoteStatus::Sent | QuoteStatus::Viewed | QuoteStatus::InNegotiation
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            QuoteStatus::Rejected | QuoteStatus::Expired | QuoteStatus::ConvertedToOrder
        )
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationLineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub description: String,
    pub quantity: u64,
    pub unit_price: i64,
    pub total_price: i64,
    pub currency_code: String,
}

impl QuotationLineItem {
    pub fn expected_total(&self) -> i64 {
        self.unit_price.saturating_mul(self.quantity as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    Payment,
    Delivery,
    Warranty,
    Cancellation,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationTerm {
    pub id: String,
    pub term_type: TermType,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationVersion {
    pub id: QuotationVersionId,
    pub rfq_request_id: RfqId,
    pub seller_id: String,
    pub version_number: u32,
    pub status: QuoteStatus,
    pub total_amount: i64,
    pub currency_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub line_items: Vec<QuotationLineItem>,
    #[serde(default)]
    pub terms: Vec<QuotationTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version_id: Option<QuotationVersionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuotationVersion {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(true, |until| now <= until)
    }

    /// Open offer that has not passed its validity window.
    pub fn is_acceptable_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open_offer() && self.is_valid_at(now)
    }

    pub fn supersedes(&self, other: &QuotationVersionId) -> bool {
        self.parent_version_id.as_ref() == Some(other)
    }

    pub fn line_items_total(&self) -> i64 {
        self.line_items.iter().map(|item| item.total_price).sum()
    }

    /// Line items whose `total_price` disagrees with `quantity * unit_price`.
    pub fn inconsistent_line_items(&self) -> impl Iterator<Item = &QuotationLineItem> {
        self.line_items
            .iter()
            .filter(|item| item.total_price != item.expected_total())
    }
}

/// A buyer's counter-offer on a quotation version. The seller side answers
/// with a new version; the negotiated one is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOffer {
    /// Minor currency units.
    pub proposed_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<ProposedLineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedLineItem {
    pub description: String,
    pub quantity: u64,
    pub unit_price: i64,
}

impl CounterOffer {
    pub fn new(proposed_amount: i64) -> Self {
        Self {
            proposed_amount,
            notes: None,
            line_items: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), RfqError> {
        if self.proposed_amount <= 0 {
            return Err(RfqError::InvalidAmount(self.proposed_amount));
        }
        if self
            .line_items
            .iter()
            .any(|item| item.quantity == 0 || item.description.trim().is_empty())
        {
            return Err(RfqError::MissingField { field: "line_items" });
        }
        Ok(())
    }
}

/// Walks `parent_version_id` links from `id` back to the original offer.
/// The returned chain starts at `id`. Unknown parents and cycles end the walk.
pub fn revision_chain<'a>(
    versions: &'a [QuotationVersion],
    id: &QuotationVersionId,
) -> Vec<&'a QuotationVersion> {
    let mut chain: Vec<&QuotationVersion> = Vec::new();
    let mut cursor = versions.iter().find(|v| &v.id == id);

    while let Some(version) = cursor {
        if chain.iter().any(|seen| seen.id == version.id) {
            break;
        }
        chain.push(version);
        cursor = version
            .parent_version_id
            .as_ref()
            .and_then(|parent| versions.iter().find(|v| &v.id == parent));
    }
    chain
}

/// Versions that no other version supersedes, i.e. the current offer of each
/// revision chain.
pub fn latest_versions(versions: &[QuotationVersion]) -> Vec<&QuotationVersion> {
    versions
        .iter()
        .filter(|candidate| !versions.iter().any(|v| v.supersedes(&candidate.id)))
        .collect()
}

/// Version number the next version for an RFQ is expected to carry.
pub fn next_version_number(versions: &[QuotationVersion]) -> u32 {
    versions
        .iter()
        .map(|v| v.version_number)
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(id: &str, number: u32, parent: Option<&str>) -> QuotationVersion {
        let now = Utc::now();
        QuotationVersion {
            id: id.into(),
            rfq_request_id: "rfq_1".into(),
            seller_id: "sel_1".into(),
            version_number: number,
            status: QuoteStatus::Sent,
            total_amount: 250_000,
            currency_code: "USD".into(),
            valid_until: None,
            delivery_days: Some(14),
            notes: None,
            line_items: vec![QuotationLineItem {
                id: None,
                description: "Scope 1-3 assessment".into(),
                quantity: 2,
                unit_price: 125_000,
                total_price: 250_000,
                currency_code: "USD".into(),
            }],
            terms: Vec::new(),
            parent_version_id: parent.map(Into::into),
            seller: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn chain_follows_parents() {
        let versions = vec![
            version("qv_1", 1, None),
            version("qv_2", 2, Some("qv_1")),
            version("qv_3", 3, Some("qv_2")),
        ];
        let chain: Vec<_> = revision_chain(&versions, &"qv_3".into())
            .into_iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(chain, vec![3, 2, 1]);
        assert_eq!(next_version_number(&versions), 4);
    }

    #[test]
    fn chain_stops_on_cycle() {
        let versions = vec![version("qv_1", 1, Some("qv_2")), version("qv_2", 2, Some("qv_1"))];
        assert_eq!(revision_chain(&versions, &"qv_1".into()).len(), 2);
    }

    #[test]
    fn latest_excludes_superseded() {
        let versions = vec![
            version("qv_1", 1, None),
            version("qv_2", 2, Some("qv_1")),
            version("qv_other", 1, None),
        ];
        let latest: Vec<_> = latest_versions(&versions).iter().map(|v| v.id.as_str()).collect();
        assert_eq!(latest, vec!["qv_2", "qv_other"]);
    }

    #[test]
    fn validity_window() {
        let mut v = version("qv_1", 1, None);
        let now = Utc::now();
        assert!(v.is_acceptable_at(now));
        v.valid_until = Some(now - chrono::Duration::days(1));
        assert!(!v.is_acceptable_at(now));
        v.valid_until = None;
        v.status = QuoteStatus::Rejected;
        assert!(!v.is_acceptable_at(now));
    }

    #[test]
    fn counter_offer_validation() {
        assert!(CounterOffer::new(180_000).validate().is_ok());
        assert_eq!(CounterOffer::new(0).validate(), Err(RfqError::InvalidAmount(0)));
        let mut offer = CounterOffer::new(180_000);
        offer.line_items.push(ProposedLineItem {
            description: "Site visit".into(),
            quantity: 0,
            unit_price: 10_000,
        });
        assert!(offer.validate().is_err());
        let body = serde_json::to_value(CounterOffer::new(5)).unwrap();
        assert!(body.get("line_items").is_none());
    }

    #[test]
    fn line_item_totals() {
        let mut v = version("qv_1", 1, None);
        assert_eq!(v.line_items_total(), 250_000);
        assert_eq!(v.inconsistent_line_items().count(), 0);
        v.line_items[0].total_price = 1;
        assert_eq!(v.inconsistent_line_items().count(), 1);
    }
}
