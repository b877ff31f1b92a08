//! Typed extraction of `tools/call` arguments.
//!
//! Tool handlers receive the caller's argument object wrapped in
//! [`Arguments`] and pull out typed values. A missing or mistyped value is
//! an [`ArgumentError`], never a silent default.

use std::fmt::{Display, Formatter};

use serde_json::{Map, Value};

use super::registry::ToolOutcome;

/// Why an argument could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// A required argument was absent or `null`.
    Missing(String),
    /// The argument was present with the wrong JSON type.
    WrongType {
        /// Argument name.
        name: String,
        /// Expected type description.
        expected: &'static str,
    },
    /// The argument was well-typed but outside the accepted range.
    OutOfRange {
        /// Argument name.
        name: String,
        /// Accepted range description.
        accepted: String,
    },
}

impl Display for ArgumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "{name} argument required"),
            Self::WrongType { name, expected } => write!(f, "{name} argument must be {expected}"),
            Self::OutOfRange { name, accepted } => {
                write!(f, "{name} argument must be {accepted}")
            }
        }
    }
}

impl std::error::Error for ArgumentError {}

impl From<ArgumentError> for ToolOutcome {
    fn from(err: ArgumentError) -> Self {
        Self::failure(format!("Error: {err}"))
    }
}

/// Argument object of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Wrap a decoded argument object.
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Number of arguments supplied.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw value lookup; `null` counts as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Required string argument.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::Missing`] or [`ArgumentError::WrongType`].
    pub fn require_str(&self, name: &str) -> Result<&str, ArgumentError> {
        self.optional_str(name)?
            .ok_or_else(|| ArgumentError::Missing(name.to_owned()))
    }

    /// Optional string argument.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::WrongType`] when present but not a string.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, ArgumentError> {
        self.get(name)
            .map(|v| v.as_str().ok_or_else(|| wrong_type(name, "a string")))
            .transpose()
    }

    /// Required numeric argument.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::Missing`] or [`ArgumentError::WrongType`].
    pub fn require_f64(&self, name: &str) -> Result<f64, ArgumentError> {
        self.get(name)
            .ok_or_else(|| ArgumentError::Missing(name.to_owned()))?
            .as_f64()
            .ok_or_else(|| wrong_type(name, "a number"))
    }

    /// Optional integer argument.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::WrongType`] when present but not an integer.
    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, ArgumentError> {
        self.get(name)
            .map(|v| v.as_i64().ok_or_else(|| wrong_type(name, "an integer")))
            .transpose()
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn wrong_type(name: &str, expected: &'static str) -> ArgumentError {
    ArgumentError::WrongType {
        name: name.to_owned(),
        expected,
    }
}
