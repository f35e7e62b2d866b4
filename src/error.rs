//! Error and degraded-outcome types.
//!
//! The planning core never fails on malformed input. It substitutes a safe
//! default and records an [`InputIssue`] on an [`Outcome`] so the caller can
//! decide whether to log, alert or ignore. [`ValidationError`] is the hard
//! error used by constructors and the HTTP boundary.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Rejected user input for cargo items and containers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Unknown container type: {0}")]
    UnknownContainer(String),
}

/// Malformed input that the core tolerated by substituting a default.
#[derive(Debug, Clone, PartialEq, Error, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputIssue {
    #[error("item '{item_id}' uses an unrecognized unit")]
    UnrecognizedUnit { item_id: String },
    #[error("item '{item_id}' has an invalid {axis}: {value}")]
    InvalidDimension {
        item_id: String,
        axis: String,
        value: f64,
    },
    #[error("item '{item_id}' has an invalid weight: {value}")]
    InvalidWeight { item_id: String, value: f64 },
    #[error("container '{container_id}' has no volume")]
    ZeroContainerVolume { container_id: String },
}

impl InputIssue {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            InputIssue::UnrecognizedUnit { .. } => "unrecognized_unit",
            InputIssue::InvalidDimension { .. } => "invalid_dimension",
            InputIssue::InvalidWeight { .. } => "invalid_weight",
            InputIssue::ZeroContainerVolume { .. } => "zero_container_volume",
        }
    }
}

/// A computed value together with the input issues that were papered over
/// while computing it.
///
/// An outcome without issues is clean. A degraded outcome still carries a
/// usable value, built from safe defaults for the malformed parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub issues: Vec<InputIssue>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    pub fn degraded(value: T, issues: Vec<InputIssue>) -> Self {
        Self { value, issues }
    }

    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Drops the issue list and keeps the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Converts to a `Result`, treating any issue as failure.
    pub fn into_strict(self) -> Result<T, Vec<InputIssue>> {
        if self.issues.is_empty() {
            Ok(self.value)
        } else {
            Err(self.issues)
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            issues: self.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_outcome_is_strict_ok() {
        let outcome = Outcome::clean(5);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_strict(), Ok(5));
    }

    #[test]
    fn degraded_outcome_keeps_value_and_issues() {
        let issue = InputIssue::UnrecognizedUnit {
            item_id: "a".to_string(),
        };
        let outcome = Outcome::degraded(0.0, vec![issue.clone()]).map(|v| v + 1.0);

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value, 1.0);
        assert_eq!(outcome.clone().into_value(), 1.0);
        assert_eq!(outcome.into_strict(), Err(vec![issue]));
    }

    #[test]
    fn issue_codes_and_messages() {
        let issue = InputIssue::InvalidDimension {
            item_id: "crate-7".to_string(),
            axis: "height".to_string(),
            value: -2.0,
        };
        assert_eq!(issue.code(), "invalid_dimension");
        assert_eq!(issue.to_string(), "item 'crate-7' has an invalid height: -2");
    }
}
