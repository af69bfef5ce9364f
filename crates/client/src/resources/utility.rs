//! Utility resource
//!
//! Processor runs: hand the service a batch of transaction ids to work
//! through. Ids arrive from callers as numbers or numeric text and are
//! sanitized before anything goes on the wire.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::client::OmedaClient;
use crate::error::{OmedaError, Result};

/// A transaction reference accepted by [`UtilityApi::run_processor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionId {
    /// Numeric transaction id
    Id(i64),
    /// Transaction id as text, parsed before dispatch
    Text(String),
}

impl TransactionId {
    /// Resolve to a positive numeric id, if the reference holds one
    fn resolve(&self) -> Option<i64> {
        let id = match self {
            Self::Id(id) => *id,
            Self::Text(raw) => raw.trim().parse().ok()?,
        };
        (id > 0).then_some(id)
    }
}

impl From<i64> for TransactionId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for TransactionId {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

#[derive(Debug, Serialize)]
struct ProcessorTransaction {
    #[serde(rename = "TransactionId")]
    transaction_id: i64,
}

/// Utility operations, scoped to the configured brand
#[derive(Debug)]
pub struct UtilityApi<'a> {
    client: &'a OmedaClient,
}

impl<'a> UtilityApi<'a> {
    /// Registry name for this resource
    pub const NAME: &'static str = "utility";

    pub(crate) fn new(client: &'a OmedaClient) -> Self {
        Self { client }
    }

    /// Run the processor over a batch of transactions
    ///
    /// Issues `POST /brand/{brand_key}/runprocessor/*` with one
    /// `{"TransactionId": n}` object per usable id. Non-positive, empty,
    /// and unparsable ids are dropped with a warning before dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] if no usable id remains
    /// after sanitization; nothing is dispatched in that case.
    pub async fn run_processor<I>(&self, transaction_ids: I) -> Result<Value>
    where
        I: IntoIterator,
        I::Item: Into<TransactionId>,
    {
        let mut transactions = Vec::new();
        let mut dropped = 0usize;
        for id in transaction_ids {
            match id.into().resolve() {
                Some(id) => transactions.push(ProcessorTransaction { transaction_id: id }),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropping unusable transaction ids");
        }
        if transactions.is_empty() {
            return Err(OmedaError::InvalidArgument(
                "transaction ids must contain at least one usable id".to_string(),
            ));
        }

        let body = serde_json::to_value(&transactions).map_err(|err| {
            OmedaError::InvalidArgument(format!("failed to serialize transaction ids: {err}"))
        })?;
        let endpoint = self.client.brand_endpoint("runprocessor/*")?;
        let response = self.client.post(&endpoint, body).await?;
        self.client.parse_api_response(response).await
    }
}
