//! # tese-storefront
//!
//! Buyer-facing HTTP surface of the tese.io sustainability marketplace.
//!
//! This binary provides:
//! - **RFQ workflow**: submit requests for quotation, accept a seller's quote,
//!   counter-offer and convert an accepted quote into an order
//! - **Negotiation threads** with the proposal limit enforced before sending
//! - **Buyer/seller chat** over Matrix or TalkJS
//! - **Service catalog and product search** proxied from the commerce backend

mod api;
mod config;
mod error;
mod session;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tese_client::{provider_from_config, BackendClient};

use crate::api::AppState;
use crate::config::StorefrontConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,tese_storefront=debug,tese_client=debug")
            }),
        )
        .init();

    info!("Starting tese.io storefront v{}", env!("CARGO_PKG_VERSION"));

    let config = StorefrontConfig::from_env();
    info!(
        site = %config.site_name,
        backend = %config.client.backend_url,
        chat = config.client.chat_provider().as_str(),
        default_region = ?config.default_region,
        "Loaded configuration"
    );

    let http = reqwest::Client::builder().build()?;
    let backend = BackendClient::with_http(
        http.clone(),
        &config.client.backend_url,
        &config.client.publishable_key,
    )?;
    let chat = provider_from_config(&config.client, backend.clone(), http)?;

    let http_addr = config.http_addr;
    let app_state = AppState {
        backend,
        chat,
        config: Arc::new(config),
    };

    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
