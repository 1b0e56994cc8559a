//! Error types for model construction and constraint assembly.

use thiserror::Error;

/// Errors that can occur while building a model or assembling constraints.
///
/// All of these are programming or model-authoring errors; steady-state
/// assembly of a validated model never produces them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Model topology or parameters are inconsistent.
    #[error("invalid model: {reason}")]
    InvalidModel {
        /// Description of what's wrong.
        reason: String,
    },

    /// An array length does not match the model dimension it must equal.
    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        /// Name of the offending array.
        what: &'static str,
        /// Length required by the model.
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// A contact handed to assembly is inconsistent with the model.
    #[error("invalid contact {index}: {reason}")]
    InvalidContact {
        /// Position of the contact in the contact list.
        index: usize,
        /// Description of what's wrong.
        reason: String,
    },

    /// A sparse index array is not strictly increasing or is out of range.
    #[error("invalid sparse indices at position {position}: {reason}")]
    InvalidSparseIndices {
        /// Position of the first offending entry.
        position: usize,
        /// Description of the violation.
        reason: String,
    },

    /// Conversion to a compressed sparse format was rejected.
    #[error("sparse format error: {reason}")]
    SparseFormat {
        /// Description reported by the sparse backend.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid model error.
    #[must_use]
    pub fn invalid_model(reason: impl Into<String>) -> Self {
        Self::InvalidModel {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create an invalid contact error.
    #[must_use]
    pub fn invalid_contact(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidContact {
            index,
            reason: reason.into(),
        }
    }

    /// Create an invalid sparse indices error.
    #[must_use]
    pub fn invalid_sparse_indices(position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSparseIndices {
            position,
            reason: reason.into(),
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Check if this is a model error.
    #[must_use]
    pub fn is_model_error(&self) -> bool {
        matches!(self, Self::InvalidModel { .. })
    }

    /// Check if this is a contact error.
    #[must_use]
    pub fn is_contact_error(&self) -> bool {
        matches!(self, Self::InvalidContact { .. })
    }
}
