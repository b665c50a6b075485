// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::unmarshal::UnmarshalError;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("unsupported state format version `{0}`; only major versions 0 and 1 are supported")]
    UnsupportedFormatVersion(String),

    #[error("no provider `{provider}` found in the provider schemas (resource {address})")]
    UnknownProvider { provider: String, address: String },

    #[error("no {kind} type `{resource_type}` found in the schema of provider `{provider}`")]
    UnknownResourceType {
        kind: &'static str,
        resource_type: String,
        provider: String,
    },

    #[error("converting {address}: {source}")]
    Unmarshal {
        address: String,
        source: UnmarshalError,
    },

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}
