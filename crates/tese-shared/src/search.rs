//! Product search against the storefront search index.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SEARCH_FACETS, MAX_VALUES_PER_FACET, SEARCH_HITS_PER_PAGE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Zero-based page.
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_hits_per_page")]
    pub hits_per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    #[serde(default = "default_facets")]
    pub facets: Vec<String>,
    #[serde(default = "default_max_values_per_facet")]
    pub max_values_per_facet: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "currency_code")]
    pub currency_code: Option<String>,
    /// Shopper's country. Only used to build the default listing filter.
    #[serde(default, skip_serializing)]
    pub country_code: Option<String>,
    /// Required by the index; callers fill in a default region when empty.
    #[serde(default, rename = "region_id")]
    pub region_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "customer_id")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "customer_group_id")]
    pub customer_group_id: Vec<String>,
}

fn default_hits_per_page() -> u32 {
    SEARCH_HITS_PER_PAGE
}

fn default_facets() -> Vec<String> {
    DEFAULT_SEARCH_FACETS.iter().map(|f| f.to_string()).collect()
}

fn default_max_values_per_facet() -> u32 {
    MAX_VALUES_PER_FACET
}

impl ProductSearchRequest {
    pub fn new(region_id: impl Into<String>) -> Self {
        Self {
            query: None,
            page: 0,
            hits_per_page: default_hits_per_page(),
            filters: None,
            facets: default_facets(),
            max_values_per_facet: default_max_values_per_facet(),
            currency_code: None,
            country_code: None,
            region_id: region_id.into(),
            customer_id: None,
            customer_group_id: Vec::new(),
        }
    }
}

/// Metadata attached when the index ran an AI-assisted query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiSearchMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchResponse {
    /// Product documents are owned by the commerce backend and passed through.
    #[serde(default)]
    pub products: Vec<serde_json::Value>,
    #[serde(default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub nb_pages: u32,
    #[serde(default)]
    pub hits_per_page: u32,
    #[serde(default)]
    pub facets: serde_json::Map<String, serde_json::Value>,
    #[serde(default, rename = "processingTimeMS")]
    pub processing_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "ai_metadata")]
    pub ai_metadata: Option<AiSearchMetadata>,
}

impl ProductSearchResponse {
    pub fn empty(request: &ProductSearchRequest) -> Self {
        Self {
            products: Vec::new(),
            nb_hits: 0,
            page: request.page,
            nb_pages: 0,
            hits_per_page: request.hits_per_page,
            facets: serde_json::Map::new(),
            processing_time_ms: 0,
            ai_metadata: None,
        }
    }
}

/// Builds the index filter expression used by product listing pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub seller_handle: Option<String>,
    pub country_code: String,
    pub currency_code: String,
    pub category_id: Option<String>,
    pub collection_id: Option<String>,
    /// Already-rendered facet filter suffix, e.g. `AND variants.color:green`.
    pub facet_filters: String,
}

impl ListingFilter {
    pub fn new(country_code: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
            currency_code: currency_code.into(),
            ..Default::default()
        }
    }

    pub fn build(&self) -> String {
        let mut clauses = vec!["NOT seller:null".to_string()];
        if let Some(handle) = &self.seller_handle {
            clauses.push(format!("seller.handle:{handle}"));
        }
        clauses.push("NOT seller.store_status:SUSPENDED".to_string());
        clauses.push(format!("supported_countries:{}", self.country_code));
        clauses.push(format!(
            "variants.prices.currency_code:{}",
            self.currency_code
        ));
        clauses.push("variants.prices.amount > 0".to_string());
        // Collections only narrow a category listing.
        if let Some(category) = &self.category_id {
            clauses.push(format!("categories.id:{category}"));
            if let Some(collection) = &self.collection_id {
                clauses.push(format!("collections.id:{collection}"));
            }
        }

        let mut filter = clauses.join(" AND ");
        let facets = self.facet_filters.trim();
        if !facets.is_empty() {
            filter.push(' ');
            filter.push_str(facets);
        }
        filter
    }
}
