//! # Omeda Client
//!
//! Typed client for the Omeda marketing/CRM REST API.
//!
//! This crate contains:
//! - A configured [`OmedaClient`] owning settings, environment, and transport
//! - Typed resource accessors for brand, customer, omail, and utility calls
//! - One request pipeline handling headers, body rendering, and status checks
//! - One error taxonomy ([`OmedaError`]) across configuration and dispatch
//!
//! ## Usage
//!
//! ```no_run
//! use omeda_client::OmedaClient;
//!
//! # async fn run() -> omeda_client::Result<()> {
//! let mut client = OmedaClient::new()?;
//! client.configure([
//!     ("client_key", "acme"),
//!     ("brand_key", "acmemag"),
//!     ("app_id", "YOUR-APP-ID"),
//!     ("input_id", "9000"),
//! ])?;
//!
//! let customer = client.customer().lookup(12345, true).await?;
//! let ack = client
//!     .omail()
//!     .opt_out_deployment("reader@example.com", 3i64, Some("preference center"))
//!     .await?;
//! # let _ = (customer, ack);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod environment;
pub mod error;
pub mod http;
pub mod params;
pub mod resources;

// Re-export commonly used items
pub use client::{OmedaClient, OmedaClientBuilder, APP_ID_HEADER, INPUT_ID_HEADER};
pub use environment::Environment;
pub use error::{OmedaError, Result};
pub use http::{HttpClient, HttpClientBuilder};
pub use params::ParameterSet;
pub use resources::{
    BrandApi, CustomerApi, IdList, OmailApi, Resource, TransactionId, UtilityApi,
    MAX_MERGE_REDIRECTS,
};

/// User-Agent reported to the service
pub const USER_AGENT: &str = concat!("omeda-client/", env!("CARGO_PKG_VERSION"));
