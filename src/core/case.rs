//! Case definitions
//!
//! A case is a flat, self-describing mapping of parameters for one run.
//! Cases are created once by a sweep driver, sent to exactly one worker
//! and never mutated afterwards.

use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A scalar or string value held by a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseValue {
    /// Boolean flag
    Bool(bool),
    /// Integer parameter
    Int(i64),
    /// Floating point parameter
    Float(f64),
    /// String parameter (paths, labels)
    Str(String),
}

impl CaseValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for CaseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for CaseValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CaseValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for CaseValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for CaseValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CaseValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for CaseValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// One independently runnable parameter configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Case {
    params: BTreeMap<String, CaseValue>,
}

impl Case {
    /// Create an empty case
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<CaseValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a raw value
    pub fn get(&self, key: &str) -> Option<&CaseValue> {
        self.params.get(key)
    }

    fn require(&self, key: &str) -> Result<&CaseValue> {
        self.params
            .get(key)
            .ok_or_else(|| SweepError::invalid_case(key, "is missing"))
    }

    /// Get a string value
    pub fn str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            CaseValue::Str(s) => Ok(s),
            other => Err(SweepError::invalid_case(
                key,
                format!("is a {}, expected string", other.type_name()),
            )),
        }
    }

    /// Get a string value as a path
    pub fn path(&self, key: &str) -> Result<PathBuf> {
        self.str(key).map(PathBuf::from)
    }

    /// Get an integer value
    pub fn int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            CaseValue::Int(i) => Ok(*i),
            other => Err(SweepError::invalid_case(
                key,
                format!("is a {}, expected integer", other.type_name()),
            )),
        }
    }

    /// Get a numeric value, widening integers
    pub fn float(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            CaseValue::Float(x) => Ok(*x),
            CaseValue::Int(i) => Ok(*i as f64),
            other => Err(SweepError::invalid_case(
                key,
                format!("is a {}, expected number", other.type_name()),
            )),
        }
    }

    /// Iterate over parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CaseValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the case has no parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                CaseValue::Str(s) => write!(f, "'{}': '{}'", key, s)?,
                other => write!(f, "'{}': {}", key, other)?,
            }
        }
        write!(f, "}}")
    }
}
