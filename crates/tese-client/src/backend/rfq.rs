use reqwest::Method;
use serde::{Deserialize, Serialize};

use tese_shared::quotation::QuotationVersion;
use tese_shared::rfq::{NewRfqRequest, RfqRequest, RfqUpdate};
use tese_shared::{ListParams, Page, QuotationVersionId, RfqId};

use super::{found_or_none, page_or_empty, BackendClient, NO_QUERY};
use crate::error::Result;
use crate::session::Session;

#[derive(Deserialize)]
struct RfqListBody {
    #[serde(default)]
    rfq_requests: Vec<RfqRequest>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct RfqBody {
    rfq_request: RfqRequest,
}

#[derive(Serialize)]
struct AcceptQuoteBody<'a> {
    quotation_version_id: &'a QuotationVersionId,
}

/// Backend answer to an accept-quote call: both records after the transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedQuote {
    pub rfq_request: RfqRequest,
    pub quotation_version: QuotationVersion,
}

impl BackendClient {
    pub async fn try_list_rfq_requests(
        &self,
        session: &Session,
        params: &ListParams,
    ) -> Result<Page<RfqRequest>> {
        let body: RfqListBody = self.get(&["store", "rfq"], params, session).await?;
        Ok(Page {
            count: body.count.unwrap_or(body.rfq_requests.len() as u64),
            offset: body.offset.unwrap_or(params.offset),
            limit: body.limit.unwrap_or(params.limit),
            items: body.rfq_requests,
        })
    }

    /// The buyer's RFQs; an empty page when the backend cannot be reached.
    pub async fn list_rfq_requests(&self, session: &Session, params: &ListParams) -> Page<RfqRequest> {
        page_or_empty(
            self.try_list_rfq_requests(session, params).await,
            params.limit,
            "RFQ requests",
        )
    }

    pub async fn try_get_rfq_request(&self, session: &Session, id: &RfqId) -> Result<RfqRequest> {
        let body: RfqBody = self
            .get(&["store", "rfq", id.as_str()], NO_QUERY, session)
            .await?;
        Ok(body.rfq_request)
    }

    pub async fn get_rfq_request(&self, session: &Session, id: &RfqId) -> Option<RfqRequest> {
        found_or_none(
            self.try_get_rfq_request(session, id).await,
            "RFQ request",
            id.as_str(),
        )
    }

    pub async fn create_rfq_request(
        &self,
        session: &Session,
        request: &NewRfqRequest,
    ) -> Result<RfqRequest> {
        let body: RfqBody = self
            .send_json(Method::POST, &["store", "rfq"], request, session)
            .await?;
        Ok(body.rfq_request)
    }

    pub async fn update_rfq_request(
        &self,
        session: &Session,
        id: &RfqId,
        update: &RfqUpdate,
    ) -> Result<RfqRequest> {
        let body: RfqBody = self
            .send_json(Method::PATCH, &["store", "rfq", id.as_str()], update, session)
            .await?;
        Ok(body.rfq_request)
    }

    pub async fn accept_quote(
        &self,
        session: &Session,
        rfq_id: &RfqId,
        quotation_version_id: &QuotationVersionId,
    ) -> Result<AcceptedQuote> {
        self.send_json(
            Method::POST,
            &["store", "rfq", rfq_id.as_str(), "accept-quote"],
            &AcceptQuoteBody {
                quotation_version_id,
            },
            session,
        )
        .await
    }
}
