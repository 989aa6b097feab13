use reqwest::Method;
use serde::{Deserialize, Serialize};

use tese_shared::quotation::{CounterOffer, QuotationVersion};
use tese_shared::{ListParams, Page, QuotationVersionId};

use super::{found_or_none, page_or_empty, BackendClient, NO_QUERY};
use crate::error::Result;
use crate::session::Session;

#[derive(Deserialize)]
struct QuotationListBody {
    #[serde(default)]
    quotations: Vec<QuotationVersion>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct QuotationBody {
    quotation: QuotationVersion,
}

#[derive(Deserialize)]
struct OrderBody {
    order: Order,
}

/// Order created from an accepted quote. The order schema belongs to the
/// commerce backend; only the id is interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl BackendClient {
    pub async fn try_list_quotations(
        &self,
        session: &Session,
        params: &ListParams,
    ) -> Result<Page<QuotationVersion>> {
        let body: QuotationListBody = self.get(&["store", "quotations"], params, session).await?;
        Ok(Page {
            count: body.count.unwrap_or(body.quotations.len() as u64),
            offset: body.offset.unwrap_or(params.offset),
            limit: body.limit.unwrap_or(params.limit),
            items: body.quotations,
        })
    }

    pub async fn list_quotations(
        &self,
        session: &Session,
        params: &ListParams,
    ) -> Page<QuotationVersion> {
        page_or_empty(
            self.try_list_quotations(session, params).await,
            params.limit,
            "quotations",
        )
    }

    pub async fn try_get_quotation(
        &self,
        session: &Session,
        id: &QuotationVersionId,
    ) -> Result<QuotationVersion> {
        let body: QuotationBody = self
            .get(&["store", "quotations", id.as_str()], NO_QUERY, session)
            .await?;
        Ok(body.quotation)
    }

    pub async fn get_quotation(
        &self,
        session: &Session,
        id: &QuotationVersionId,
    ) -> Option<QuotationVersion> {
        found_or_none(
            self.try_get_quotation(session, id).await,
            "quotation",
            id.as_str(),
        )
    }

    /// Posts a counter-offer; the backend answers with the new version.
    pub async fn negotiate_quotation(
        &self,
        session: &Session,
        id: &QuotationVersionId,
        offer: &CounterOffer,
    ) -> Result<QuotationVersion> {
        let body: QuotationBody = self
            .send_json(
                Method::POST,
                &["store", "quotations", id.as_str(), "negotiate"],
                offer,
                session,
            )
            .await?;
        Ok(body.quotation)
    }

    pub async fn convert_quotation_to_order(
        &self,
        session: &Session,
        id: &QuotationVersionId,
    ) -> Result<Order> {
        let body: OrderBody = self
            .send_json(
                Method::POST,
                &["store", "quotations", id.as_str(), "convert-to-order"],
                &serde_json::json!({}),
                session,
            )
            .await?;
        Ok(body.order)
    }
}
