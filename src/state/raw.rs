// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The state document as written by `terraform show -json`, before any
//! typing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Type;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawState {
    pub format_version: String,

    #[serde(default)]
    pub terraform_version: Option<String>,

    #[serde(default)]
    pub values: Option<RawStateValues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStateValues {
    #[serde(default)]
    pub outputs: BTreeMap<String, RawStateOutput>,

    #[serde(default)]
    pub root_module: Option<RawStateModule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStateOutput {
    #[serde(default)]
    pub sensitive: bool,

    #[serde(default)]
    pub value: serde_json::Value,

    /// Recorded by newer versions; when missing the type is inferred.
    #[serde(rename = "type", default)]
    pub output_type: Option<Type>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStateModule {
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub resources: Vec<RawStateResource>,

    #[serde(default)]
    pub child_modules: Vec<RawStateModule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStateResource {
    pub address: String,

    #[serde(default)]
    pub mode: ResourceMode,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub name: String,

    #[serde(default)]
    pub index: Option<serde_json::Value>,

    pub provider_name: String,

    #[serde(default)]
    pub schema_version: u64,

    #[serde(rename = "values", default)]
    pub attribute_values: serde_json::Value,

    #[serde(default)]
    pub sensitive_values: Option<serde_json::Value>,

    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub tainted: bool,

    #[serde(default)]
    pub deposed_key: Option<String>,
}
