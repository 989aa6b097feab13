use serde::{Deserialize, Serialize};

use super::{BackendClient, NO_QUERY};
use crate::error::{ClientError, Result};
use crate::session::Session;

/// The signed-in buyer as the backend knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
struct CustomerBody {
    customer: Customer,
}

impl BackendClient {
    /// The customer the session's token belongs to. Anonymous sessions are
    /// refused without a round trip.
    pub async fn try_get_customer(&self, session: &Session) -> Result<Customer> {
        if !session.is_authenticated() {
            return Err(ClientError::Backend {
                status: 401,
                message: "Unauthorized".into(),
            });
        }
        let body: CustomerBody = self
            .get(&["store", "customers", "me"], NO_QUERY, session)
            .await?;
        if body.customer.id.trim().is_empty() {
            return Err(ClientError::Contract("customer response has no id".into()));
        }
        Ok(body.customer)
    }

    pub async fn get_customer(&self, session: &Session) -> Option<Customer> {
        match self.try_get_customer(session).await {
            Ok(customer) => Some(customer),
            Err(e) => {
                tracing::debug!(error = %e, "No customer for session");
                None
            }
        }
    }
}
