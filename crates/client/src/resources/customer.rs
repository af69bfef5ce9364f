//! Customer resource
//!
//! Lookups by id, encrypted id, email, and external id, plus the
//! store-customer-and-order write. When a looked-up record was merged into
//! another, the service answers 404 with the surviving id in the error
//! body; lookups follow that pointer unless the caller opts out.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{require_non_empty, require_payload};
use crate::client::OmedaClient;
use crate::error::{OmedaError, Result};

/// Lookups stop following merge pointers after this many hops and return
/// the final 404 unchanged
pub const MAX_MERGE_REDIRECTS: usize = 5;

/// Customer lookups and writes, scoped to the configured brand
#[derive(Debug)]
pub struct CustomerApi<'a> {
    client: &'a OmedaClient,
}

impl<'a> CustomerApi<'a> {
    /// Registry name for this resource
    pub const NAME: &'static str = "customer";

    pub(crate) fn new(client: &'a OmedaClient) -> Self {
        Self { client }
    }

    /// Fetch the comprehensive customer document by numeric id
    ///
    /// Issues `GET /brand/{brand_key}/customer/{customer_id}/comp/*`. With
    /// `return_merged` set, a 404 whose body names a surviving customer id
    /// is retried against that id, up to [`MAX_MERGE_REDIRECTS`] hops;
    /// without it the 404 is returned as-is.
    ///
    /// # Errors
    ///
    /// Propagates configuration, transport, API-status, and parse errors
    /// from the request pipeline.
    pub async fn lookup(&self, customer_id: i64, return_merged: bool) -> Result<Value> {
        self.lookup_following_merges(
            comprehensive_path(customer_id),
            comprehensive_path,
            return_merged,
        )
        .await
    }

    /// Fetch the base customer record (with linked record ids) by numeric id
    ///
    /// Issues `GET /brand/{brand_key}/customer/{customer_id}/*` and applies
    /// the same merge handling as [`CustomerApi::lookup`].
    ///
    /// # Errors
    ///
    /// Same contract as [`CustomerApi::lookup`].
    pub async fn lookup_by_id(&self, customer_id: i64, return_merged: bool) -> Result<Value> {
        self.lookup_following_merges(record_path(customer_id), record_path, return_merged).await
    }

    /// Fetch the base customer record by opaque encrypted id
    ///
    /// Merge pointers carry numeric ids, so any redirect continues on the
    /// numeric record path.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty id; otherwise
    /// the same contract as [`CustomerApi::lookup`].
    pub async fn lookup_by_encrypted_id(
        &self,
        encrypted_id: &str,
        return_merged: bool,
    ) -> Result<Value> {
        require_non_empty("encrypted id", encrypted_id)?;
        self.lookup_following_merges(
            format!("customer/{encrypted_id}/*"),
            record_path,
            return_merged,
        )
        .await
    }

    /// Look up customers by email address
    ///
    /// Issues `GET /brand/{brand_key}/customer/email/{email}/*`, narrowed
    /// with `/productid/{product_id}` when a product id is given.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty email address;
    /// nothing is dispatched in that case.
    pub async fn lookup_by_email(&self, email: &str, product_id: Option<i64>) -> Result<Value> {
        require_non_empty("email", email)?;
        let path = match product_id {
            Some(product_id) => format!("customer/email/{email}/productid/{product_id}/*"),
            None => format!("customer/email/{email}/*"),
        };
        self.fetch(&self.client.brand_endpoint(&path)?).await
    }

    /// Look up a customer by external id within a namespace
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] if either part is empty;
    /// nothing is dispatched in that case.
    pub async fn lookup_by_external_id(&self, namespace: &str, external_id: &str) -> Result<Value> {
        require_non_empty("namespace", namespace)?;
        require_non_empty("external id", external_id)?;
        let path = format!(
            "customer/externalcustomeridnamespace/{namespace}/externalcustomerid/{external_id}/*"
        );
        self.fetch(&self.client.brand_endpoint(&path)?).await
    }

    /// Store customer and order data
    ///
    /// Issues `POST /brand/{brand_key}/storecustomerandorder/*` with the
    /// given payload and returns the service acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty payload;
    /// nothing is dispatched in that case.
    pub async fn save(&self, payload: Value) -> Result<Value> {
        require_payload("customer payload", &payload)?;
        let endpoint = self.client.brand_endpoint("storecustomerandorder/*")?;
        let response = self.client.post(&endpoint, payload).await?;
        self.client.parse_api_response(response).await
    }

    async fn lookup_following_merges<F>(
        &self,
        first: String,
        redirected: F,
        return_merged: bool,
    ) -> Result<Value>
    where
        F: Fn(i64) -> String,
    {
        let mut endpoint = self.client.brand_endpoint(&first)?;
        let mut redirects = 0;

        loop {
            match self.fetch(&endpoint).await {
                Ok(document) => return Ok(document),
                Err(OmedaError::Api { status: 404, content })
                    if return_merged && redirects < MAX_MERGE_REDIRECTS =>
                {
                    let Some(target) = merged_target(&content) else {
                        return Err(OmedaError::Api { status: 404, content });
                    };
                    redirects += 1;
                    debug!(
                        from = %endpoint,
                        target,
                        redirects,
                        "customer was merged; following redirect"
                    );
                    endpoint = self.client.brand_endpoint(&redirected(target))?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch(&self, endpoint: &str) -> Result<Value> {
        let response = self.client.get(endpoint).await?;
        self.client.parse_api_response(response).await
    }
}

fn comprehensive_path(customer_id: i64) -> String {
    format!("customer/{customer_id}/comp/*")
}

fn record_path(customer_id: i64) -> String {
    format!("customer/{customer_id}/*")
}

/// Pull the surviving customer id out of a merged-record error body
fn merged_target(content: &str) -> Option<i64> {
    let envelope: ErrorEnvelope = serde_json::from_str(content).ok()?;
    envelope.errors.iter().find_map(|entry| entry.merged_into_customer_id)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "Errors", default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(rename = "MergedIntoCustomerId")]
    merged_into_customer_id: Option<i64>,
}
