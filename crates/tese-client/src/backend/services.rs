use reqwest::Method;
use serde::Deserialize;

use tese_shared::rfq::RfqRequest;
use tese_shared::services::{Service, ServiceFilter, ServiceQuoteRequest};
use tese_shared::Page;

use super::{found_or_none, page_or_empty, BackendClient, NO_QUERY};
use crate::error::Result;
use crate::session::Session;

const ACTIVE_ONLY: &[(&str, &str)] = &[("status", "active")];

#[derive(Deserialize)]
struct ServiceListBody {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    offset: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct ServiceBody {
    service: Service,
}

#[derive(Deserialize)]
struct RfqBody {
    rfq_request: RfqRequest,
}

impl BackendClient {
    pub async fn try_list_services(
        &self,
        session: &Session,
        filter: &ServiceFilter,
    ) -> Result<Page<Service>> {
        let builder = self
            .request(Method::GET, &["store", "services"], session)?
            .query(filter)
            .query(ACTIVE_ONLY);
        let body: ServiceListBody = self.execute(builder, &["store", "services"]).await?;
        Ok(Page {
            count: body.count.unwrap_or(body.services.len() as u64),
            offset: body.offset.unwrap_or(filter.offset),
            limit: body.limit.unwrap_or(filter.limit),
            items: body.services,
        })
    }

    /// Active catalog services matching `filter`.
    pub async fn list_services(&self, session: &Session, filter: &ServiceFilter) -> Page<Service> {
        page_or_empty(
            self.try_list_services(session, filter).await,
            filter.limit,
            "services",
        )
    }

    pub async fn try_get_service(&self, session: &Session, id: &str) -> Result<Service> {
        let body: ServiceBody = self.get(&["store", "services", id], NO_QUERY, session).await?;
        Ok(body.service)
    }

    pub async fn get_service(&self, session: &Session, id: &str) -> Option<Service> {
        found_or_none(self.try_get_service(session, id).await, "service", id)
    }

    /// Raises a service-type RFQ against `service_id`.
    pub async fn request_service_quote(
        &self,
        session: &Session,
        service_id: &str,
        request: &ServiceQuoteRequest,
    ) -> Result<RfqRequest> {
        request.validate()?;
        let body: RfqBody = self
            .send_json(
                Method::POST,
                &["store", "services", service_id, "request-quote"],
                request,
                session,
            )
            .await?;
        tracing::info!(service_id, rfq_id = %body.rfq_request.id, "Service quote requested");
        Ok(body.rfq_request)
    }
}
