use reqwest::Method;

use tese_shared::search::{ProductSearchRequest, ProductSearchResponse};

use super::BackendClient;
use crate::error::{ClientError, Result};
use crate::session::Session;

impl BackendClient {
    pub async fn try_search_products(
        &self,
        session: &Session,
        request: &ProductSearchRequest,
    ) -> Result<ProductSearchResponse> {
        if request.region_id.trim().is_empty() {
            return Err(ClientError::Configuration(
                "product search needs a region".into(),
            ));
        }
        self.send_json(
            Method::POST,
            &["store", "products", "search"],
            request,
            session,
        )
        .await
    }

    /// Product search; an empty result page when the index is unavailable.
    pub async fn search_products(
        &self,
        session: &Session,
        request: &ProductSearchRequest,
    ) -> ProductSearchResponse {
        match self.try_search_products(session, request).await {
            Ok(response) => {
                tracing::debug!(
                    hits = response.nb_hits,
                    took_ms = response.processing_time_ms,
                    "Product search"
                );
                response
            }
            Err(e) => {
                tracing::error!(error = %e, query = ?request.query, "Product search failed");
                ProductSearchResponse::empty(request)
            }
        }
    }
}
