//! Target environment selection
//!
//! Omeda exposes the same REST surface on a production host and a staging
//! host. The client targets production unless staging is requested.

use std::fmt;

const PRODUCTION_HOST: &str = "ows.omeda.com";
const STAGING_HOST: &str = "ows.omedastaging.com";

/// Upstream environment a client dispatches against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Live host serving licensed production data
    #[default]
    Production,
    /// Staging host backed by test data
    Staging,
}

impl Environment {
    /// Get the host name requests are sent to
    pub fn host(&self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_HOST,
            Self::Staging => STAGING_HOST,
        }
    }

    /// Check whether this is the staging environment
    pub fn is_staging(&self) -> bool {
        matches!(self, Self::Staging)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Staging => write!(f, "staging"),
        }
    }
}
