use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    EsgAudit,
    CarbonConsulting,
    SustainabilityStrategy,
    ImpactReporting,
    Training,
    CertificationSupport,
    SupplyChainAudit,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Draft,
    PendingApproval,
    Active,
    Suspended,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Basic,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTier {
    pub id: String,
    pub tier_level: TierLevel,
    pub name: String,
    /// Minor currency units.
    pub price: i64,
    pub currency_code: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub delivery_days: u32,
    pub revision_count: u32,
    #[serde(default)]
    pub deliverables_included: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeliverable {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    pub seller_id: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub years_experience: u32,
    pub completed_projects: u32,
    pub average_rating: f64,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub seller_id: String,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tiers: Vec<ServiceTier>,
    #[serde(default)]
    pub deliverables: Vec<ServiceDeliverable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ServiceProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Service {
    /// Cheapest tier, shown as the "from" price on listings.
    pub fn starting_tier(&self) -> Option<&ServiceTier> {
        self.tiers.iter().min_by_key(|tier| tier.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub id: String,
    pub name: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<ServiceCategory>,
}

/// Catalog query. Only `active` services are ever listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default = "default_services_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_services_limit() -> u32 {
    crate::constants::SERVICES_PAGE_LIMIT
}

impl Default for ServiceFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            service_type: None,
            q: None,
            limit: default_services_limit(),
            offset: 0,
        }
    }
}

/// Quote request raised from a service page; becomes a service-type RFQ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuoteRequest {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl ServiceQuoteRequest {
    /// Same rules as a direct RFQ submission.
    pub fn validate(&self) -> Result<(), crate::error::RfqError> {
        let mut rfq = crate::rfq::NewRfqRequest::new(
            self.title.clone(),
            self.description.clone(),
            crate::rfq::RfqType::Service,
        )
        .with_budget(self.budget_min, self.budget_max);
        if let Some(currency) = &self.currency_code {
            rfq.currency_code = currency.clone();
        }
        rfq.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_serializes_only_set_fields() {
        let filter = ServiceFilter {
            service_type: Some(ServiceType::EsgAudit),
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "service_type": "esg_audit", "limit": 12, "offset": 0 })
        );
    }

    #[test]
    fn quote_request_validation() {
        let req = ServiceQuoteRequest {
            title: "Carbon baseline".into(),
            description: "".into(),
            budget_min: None,
            budget_max: None,
            currency_code: None,
            deadline: None,
            requirements: None,
        };
        assert!(req.validate().is_err());
    }
}
