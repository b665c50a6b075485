// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Failure to give generic data the wanted type. Paths start at `$`, e.g.
/// `$.tags["env"]` or `$.rules[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnmarshalError {
    #[error("{path}: {expected} required, but got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: missing attribute \"{name}\"")]
    MissingAttribute { path: String, name: String },

    #[error("{path}: unexpected attribute \"{name}\"")]
    UnexpectedAttribute { path: String, name: String },

    #[error("{path}: tuple with {expected} elements required, but got {actual}")]
    TupleLength {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: mapping keys must be strings, but got {key_type}")]
    NonStringKey { path: String, key_type: String },

    #[error("{path}: number `{literal}` cannot be represented exactly")]
    UnrepresentableNumber { path: String, literal: String },

    #[error("{path}: data nested deeper than {limit} levels")]
    DepthExceeded { path: String, limit: usize },
}

impl UnmarshalError {
    /// Where in the data the failure occurred.
    pub fn path(&self) -> &str {
        match self {
            UnmarshalError::TypeMismatch { path, .. }
            | UnmarshalError::MissingAttribute { path, .. }
            | UnmarshalError::UnexpectedAttribute { path, .. }
            | UnmarshalError::TupleLength { path, .. }
            | UnmarshalError::NonStringKey { path, .. }
            | UnmarshalError::UnrepresentableNumber { path, .. }
            | UnmarshalError::DepthExceeded { path, .. } => path,
        }
    }
}
