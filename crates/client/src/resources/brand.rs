//! Brand resource
//!
//! A brand is one audience/publication under a licensed client. The
//! comprehensive lookup returns the brand description together with its
//! contact types, demographics, deployment types, and products.

use serde_json::Value;

use crate::client::OmedaClient;
use crate::error::Result;

/// Brand lookups, scoped to the configured brand key
#[derive(Debug)]
pub struct BrandApi<'a> {
    client: &'a OmedaClient,
}

impl<'a> BrandApi<'a> {
    /// Registry name for this resource
    pub const NAME: &'static str = "brand";

    pub(crate) fn new(client: &'a OmedaClient) -> Self {
        Self { client }
    }

    /// Fetch the comprehensive brand document
    ///
    /// Issues `GET /brand/{brand_key}/comp/*` and decodes the structured
    /// response.
    ///
    /// # Errors
    ///
    /// Propagates configuration, transport, API-status, and parse errors
    /// from the request pipeline.
    pub async fn lookup(&self) -> Result<Value> {
        let endpoint = self.client.brand_endpoint("comp/*")?;
        let response = self.client.get(&endpoint).await?;
        self.client.parse_api_response(response).await
    }
}
