//! Fully-qualified variable names.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Separator between the input id and the variable name.
pub const SEPARATOR: &str = "::";

/// A variable name qualified by the input it is read from, e.g.
/// `"hydro::temp"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariableName {
    input_id: String,
    variable: String,
}

impl VariableName {
    pub fn new(input_id: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            input_id: input_id.into(),
            variable: variable.into(),
        }
    }

    /// Parse a fully-qualified name like `"hydro::temp"`.
    ///
    /// Both halves must be non-empty and the separator must appear exactly once.
    pub fn parse(s: &str) -> ModelResult<Self> {
        let mut parts = s.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(input_id), Some(variable), None)
                if !input_id.trim().is_empty() && !variable.trim().is_empty() =>
            {
                Ok(Self::new(input_id.trim(), variable.trim()))
            }
            _ => Err(ModelError::MalformedVariableName(s.to_string())),
        }
    }

    pub fn input_id(&self) -> &str {
        &self.input_id
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl std::fmt::Display for VariableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.input_id, SEPARATOR, self.variable)
    }
}

impl TryFrom<String> for VariableName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VariableName> for String {
    fn from(value: VariableName) -> Self {
        value.to_string()
    }
}
