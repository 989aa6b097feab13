//! Buyer-side RFQ lifecycle actions.
//!
//! Each action checks the local rules first, then asks the backend for the
//! transition and hands back the record the backend returned. A resulting
//! status is never computed locally.

use chrono::Utc;
use tracing::{info, warn};

use tese_shared::quotation::{CounterOffer, QuotationVersion, QuoteStatus};
use tese_shared::rfq::{NewRfqRequest, RfqRequest, RfqStatus, RfqUpdate};
use tese_shared::{QuotationVersionId, RfqError, RfqId};

use crate::backend::{AcceptedQuote, BackendClient, Order};
use crate::error::{ClientError, Result};
use crate::session::Session;

pub struct RfqWorkflow<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
}

impl<'a> RfqWorkflow<'a> {
    pub fn new(backend: &'a BackendClient, session: &'a Session) -> Self {
        Self { backend, session }
    }

    pub async fn submit(&self, request: &NewRfqRequest) -> Result<RfqRequest> {
        request.validate()?;
        let created = well_formed(self.backend.create_rfq_request(self.session, request).await?)?;
        if created.status != RfqStatus::Submitted {
            warn!(rfq_id = %created.id, status = %created.status, "New RFQ not reported as submitted");
        }
        info!(rfq_id = %created.id, rfq_type = ?created.rfq_type, "RFQ submitted");
        Ok(created)
    }

    pub async fn update(&self, id: &RfqId, update: &RfqUpdate) -> Result<RfqRequest> {
        let current = well_formed(self.backend.try_get_rfq_request(self.session, id).await?)?;
        current.ensure_mutable()?;
        update.validate_against(&current)?;
        let updated = well_formed(
            self.backend
                .update_rfq_request(self.session, id, update)
                .await?,
        )?;
        info!(rfq_id = %id, status = %updated.status, "RFQ updated");
        Ok(updated)
    }

    /// Accepts one of the RFQ's own quotation versions.
    pub async fn accept_quote(
        &self,
        rfq_id: &RfqId,
        quotation_id: &QuotationVersionId,
    ) -> Result<AcceptedQuote> {
        let rfq = well_formed(self.backend.try_get_rfq_request(self.session, rfq_id).await?)?;
        rfq.ensure_mutable()?;
        let now = Utc::now();
        if rfq.is_lapsed(now) {
            return Err(RfqError::Lapsed(rfq.id).into());
        }
        if !rfq.status.accepts_quotes() {
            return Err(RfqError::InvalidTransition {
                from: rfq.status,
                to: RfqStatus::Accepted,
            }
            .into());
        }

        let quotation = self.owned_quotation(&rfq, quotation_id).await?;
        if !quotation.is_valid_at(now) {
            return Err(RfqError::QuotationExpired(quotation.id.clone()).into());
        }
        if !quotation.status.is_open_offer() {
            return Err(RfqError::QuotationNotAcceptable {
                id: quotation.id.clone(),
                status: quotation.status,
            }
            .into());
        }

        let mut accepted = self
            .backend
            .accept_quote(self.session, rfq_id, quotation_id)
            .await?;
        accepted.rfq_request = well_formed(accepted.rfq_request)?;
        if accepted.rfq_request.id != *rfq_id || accepted.quotation_version.id != *quotation_id {
            return Err(ClientError::Contract(format!(
                "accept-quote for {rfq_id}/{quotation_id} answered with {}/{}",
                accepted.rfq_request.id, accepted.quotation_version.id
            )));
        }
        info!(
            rfq_id = %rfq_id,
            quotation_id = %quotation_id,
            rfq_status = %accepted.rfq_request.status,
            "Quote accepted"
        );
        Ok(accepted)
    }

    /// Sends a counter-offer and returns the new version that supersedes
    /// `quotation_id`.
    pub async fn negotiate(
        &self,
        quotation_id: &QuotationVersionId,
        offer: &CounterOffer,
    ) -> Result<QuotationVersion> {
        offer.validate()?;
        let current = self.backend.try_get_quotation(self.session, quotation_id).await?;
        if !current.is_acceptable_at(Utc::now()) {
            return Err(RfqError::QuotationNotAcceptable {
                id: current.id,
                status: current.status,
            }
            .into());
        }

        let revised = self
            .backend
            .negotiate_quotation(self.session, quotation_id, offer)
            .await?;
        if revised.id == current.id || !revised.supersedes(&current.id) {
            return Err(ClientError::Contract(format!(
                "negotiating {} did not produce a new version superseding it",
                current.id
            )));
        }
        info!(
            quotation_id = %current.id,
            new_version = %revised.id,
            version_number = revised.version_number,
            "Counter-offer sent"
        );
        Ok(revised)
    }

    pub async fn convert_to_order(&self, quotation_id: &QuotationVersionId) -> Result<Order> {
        let quotation = self.backend.try_get_quotation(self.session, quotation_id).await?;
        if quotation.status != QuoteStatus::Accepted {
            return Err(RfqError::QuotationNotAccepted {
                id: quotation.id,
                status: quotation.status,
            }
            .into());
        }
        let order = self
            .backend
            .convert_quotation_to_order(self.session, quotation_id)
            .await?;
        info!(quotation_id = %quotation_id, order_id = %order.id, "Quote converted to order");
        Ok(order)
    }

    /// The version from the RFQ's own list, or a fetched copy whose
    /// `rfq_request_id` matches when the list was not embedded.
    async fn owned_quotation(
        &self,
        rfq: &RfqRequest,
        quotation_id: &QuotationVersionId,
    ) -> Result<QuotationVersion> {
        if !rfq.quotation_versions.is_empty() {
            return Ok(rfq.ensure_owns_quotation(quotation_id)?.clone());
        }
        let foreign = || RfqError::ForeignQuotation {
            rfq: rfq.id.clone(),
            quotation: quotation_id.clone(),
        };
        match self.backend.try_get_quotation(self.session, quotation_id).await {
            Ok(quotation) if quotation.rfq_request_id == rfq.id => Ok(quotation),
            Ok(_) | Err(ClientError::NotFound(_)) => Err(foreign().into()),
            Err(e) => Err(e),
        }
    }
}

/// Backend records must satisfy the same rules the buyer's input does.
fn well_formed(rfq: RfqRequest) -> Result<RfqRequest> {
    match rfq.validate() {
        Ok(()) => Ok(rfq),
        Err(e) => Err(ClientError::Contract(format!(
            "backend returned RFQ {} that breaks its own rules: {e}",
            rfq.id
        ))),
    }
}
