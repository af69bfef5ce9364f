//! Typed accessors for the Omeda resource families
//!
//! Each resource borrows a configured [`OmedaClient`] and builds its
//! endpoints through the client's brand- and client-scoped helpers. The
//! string-keyed registry ([`OmedaClient::resource`]) and the typed
//! accessors hand out the same borrowed views.
//!
//! [`OmedaClient`]: crate::client::OmedaClient
//! [`OmedaClient::resource`]: crate::client::OmedaClient::resource

mod brand;
mod customer;
mod omail;
mod utility;

pub use brand::BrandApi;
pub use customer::{CustomerApi, MAX_MERGE_REDIRECTS};
pub use omail::OmailApi;
pub use utility::{TransactionId, UtilityApi};

use serde_json::Value;

use crate::error::{OmedaError, Result};

/// A resource resolved from the registry by name
#[derive(Debug)]
pub enum Resource<'a> {
    /// Brand lookups
    Brand(BrandApi<'a>),
    /// Customer lookups and writes
    Customer(CustomerApi<'a>),
    /// Email deployment operations
    Omail(OmailApi<'a>),
    /// Utility operations
    Utility(UtilityApi<'a>),
}

impl Resource<'_> {
    /// Get the name this resource is registered under
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brand(_) => BrandApi::NAME,
            Self::Customer(_) => CustomerApi::NAME,
            Self::Omail(_) => OmailApi::NAME,
            Self::Utility(_) => UtilityApi::NAME,
        }
    }
}

/// One or more numeric ids, accepted wherever the API takes an id list
///
/// Single ids convert implicitly, so callers can pass `3`, `[3, 4]`, or a
/// `Vec<i64>` interchangeably.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList(Vec<i64>);

impl IdList {
    /// View the ids as a slice
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Check whether the list holds no ids
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<i64> {
        self.0
    }
}

impl From<i64> for IdList {
    fn from(id: i64) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<i64>> for IdList {
    fn from(ids: Vec<i64>) -> Self {
        Self(ids)
    }
}

impl From<&[i64]> for IdList {
    fn from(ids: &[i64]) -> Self {
        Self(ids.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for IdList {
    fn from(ids: [i64; N]) -> Self {
        Self(ids.to_vec())
    }
}

pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(OmedaError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

pub(crate) fn require_ids(name: &str, ids: &IdList) -> Result<()> {
    if ids.is_empty() {
        return Err(OmedaError::InvalidArgument(format!("{name} must contain at least one id")));
    }
    Ok(())
}

pub(crate) fn require_payload(name: &str, payload: &Value) -> Result<()> {
    let empty = match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    };
    if empty {
        return Err(OmedaError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}
