//! Recognized-option definitions and validation
//!
//! A [`ParameterSet`] is a small declarative machine: options are defined
//! up front (name, optional default, required flag), then a caller-supplied
//! mapping is applied against those definitions. Validation is synchronous
//! and happens entirely in memory.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{OmedaError, Result};

/// A single option definition
#[derive(Debug, Clone)]
struct ParamDef {
    name: String,
    default: Option<String>,
    required: bool,
}

/// Declarative set of recognized options with their applied values
///
/// Applying a mapping replaces all previously applied values. Keys that
/// were never defined are ignored with a warning; defined options that are
/// absent fall back to their default, if one exists.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    defs: Vec<ParamDef>,
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    /// Create an empty set with no defined options
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a recognized option
    ///
    /// # Arguments
    /// * `name` - Option name used as the key when applying values
    /// * `default` - Value used when the applied mapping omits the option
    /// * `required` - Whether validation fails if the option ends up unset
    ///
    /// # Errors
    /// Returns [`OmedaError::Config`] if the name is already defined.
    pub fn define(&mut self, name: &str, default: Option<&str>, required: bool) -> Result<()> {
        if self.def(name).is_some() {
            return Err(OmedaError::Config(format!("option {name} is already defined")));
        }
        self.defs.push(ParamDef {
            name: name.to_string(),
            default: default.map(str::to_string),
            required,
        });
        Ok(())
    }

    /// Apply a mapping of option values, replacing all previous values
    ///
    /// Unknown keys are skipped with a warning. After the mapping is stored
    /// and defaults are filled in, the set is validated.
    ///
    /// # Errors
    /// Returns [`OmedaError::Config`] if any required option is missing or
    /// empty after application.
    pub fn apply<I, K, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.values.clear();
        for (key, value) in values {
            let key = key.as_ref();
            if self.def(key).is_some() {
                self.values.insert(key.to_string(), value.into());
            } else {
                warn!(option = key, "ignoring unrecognized option");
            }
        }
        for def in &self.defs {
            if let Some(default) = &def.default {
                if !self.values.contains_key(&def.name) {
                    self.values.insert(def.name.clone(), default.clone());
                }
            }
        }
        self.ensure_valid()
    }

    /// Check that every required option has a non-empty value
    pub fn is_valid(&self) -> bool {
        self.missing().is_empty()
    }

    /// Get the applied value of a defined option
    ///
    /// # Errors
    /// Returns [`OmedaError::InvalidArgument`] for a name that was never
    /// defined, or [`OmedaError::Config`] for a defined option with no value.
    pub fn get(&self, name: &str) -> Result<&str> {
        if self.def(name).is_none() {
            return Err(OmedaError::InvalidArgument(format!("option {name} is not defined")));
        }
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| OmedaError::Config(format!("option {name} has no value")))
    }

    /// Get all applied values keyed by option name
    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Validate, reporting which required options are missing
    pub(crate) fn ensure_valid(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            return Ok(());
        }
        Err(OmedaError::Config(format!(
            "required options are missing or empty: {}",
            missing.join(", ")
        )))
    }

    fn def(&self, name: &str) -> Option<&ParamDef> {
        self.defs.iter().find(|def| def.name == name)
    }

    fn missing(&self) -> Vec<&str> {
        self.defs
            .iter()
            .filter(|def| def.required)
            .filter(|def| match self.values.get(&def.name) {
                Some(value) => value.is_empty(),
                None => true,
            })
            .map(|def| def.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials_set() -> ParameterSet {
        let mut params = ParameterSet::new();
        params.define("api_key", None, true).unwrap();
        params.define("region", Some("us"), false).unwrap();
        params
    }

    #[test]
    fn test_duplicate_definition_is_rejected() {
        let mut params = credentials_set();
        let err = params.define("api_key", None, false).unwrap_err();
        assert!(matches!(err, OmedaError::Config(_)));
    }

    #[test]
    fn test_apply_stores_known_values() {
        let mut params = credentials_set();
        params.apply([("api_key", "abc123")]).unwrap();
        assert!(params.is_valid());
        assert_eq!(params.get("api_key").unwrap(), "abc123");
    }

    #[test]
    fn test_apply_fills_defaults() {
        let mut params = credentials_set();
        params.apply([("api_key", "abc123")]).unwrap();
        assert_eq!(params.get("region").unwrap(), "us");

        params.apply([("api_key", "abc123"), ("region", "eu")]).unwrap();
        assert_eq!(params.get("region").unwrap(), "eu");
    }

    #[test]
    fn test_apply_ignores_unknown_keys() {
        let mut params = credentials_set();
        params.apply([("api_key", "abc123"), ("color", "teal")]).unwrap();
        assert!(params.is_valid());
        assert!(matches!(params.get("color"), Err(OmedaError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_required_fails_validation() {
        let mut params = credentials_set();
        let err = params.apply([("region", "eu")]).unwrap_err();
        assert!(err.to_string().contains("api_key"));
        assert!(!params.is_valid());
    }

    #[test]
    fn test_empty_required_counts_as_missing() {
        let mut params = credentials_set();
        let err = params.apply([("api_key", "")]).unwrap_err();
        assert!(matches!(err, OmedaError::Config(_)));
        assert!(!params.is_valid());
    }

    #[test]
    fn test_apply_replaces_previous_values() {
        let mut params = ParameterSet::new();
        params.define("api_key", None, true).unwrap();
        params.define("label", None, false).unwrap();

        params.apply([("api_key", "abc123"), ("label", "first")]).unwrap();
        params.apply([("api_key", "def456")]).unwrap();

        assert_eq!(params.get("api_key").unwrap(), "def456");
        assert!(matches!(params.get("label"), Err(OmedaError::Config(_))));
    }

    #[test]
    fn test_get_undefined_option() {
        let params = credentials_set();
        let err = params.get("missing").unwrap_err();
        assert!(matches!(err, OmedaError::InvalidArgument(_)));
    }

    #[test]
    fn test_values_exposes_applied_mapping() {
        let mut params = credentials_set();
        params.apply([("api_key", "abc123")]).unwrap();
        let values = params.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("api_key").map(String::as_str), Some("abc123"));
    }
}
