// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Typed view of a state document.
//!
//! The attribute values of every resource in a JSON state document are
//! unmarshalled against the implied type of the resource's schema, taken
//! from the provider schemas (`terraform providers schema -json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::BlockSchema;
use crate::types::Type;
use crate::unmarshal::unmarshal;
use crate::value::Value;

mod error;
pub mod raw;

pub use error::StateError;
pub use raw::{RawState, ResourceMode};

use raw::{RawStateModule, RawStateOutput, RawStateResource};

/// Schemas of all providers, keyed by provider address.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSchemas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<String>,

    #[serde(rename = "provider_schemas", default)]
    pub schemas: BTreeMap<String, ProviderSchema>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ResourceSchema>,

    #[serde(default)]
    pub resource_schemas: BTreeMap<String, ResourceSchema>,

    #[serde(default)]
    pub data_source_schemas: BTreeMap<String, ResourceSchema>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub block: BlockSchema,
}

impl ProviderSchemas {
    pub fn from_json(s: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub format_version: String,
    pub terraform_version: Option<String>,
    pub values: Option<StateValues>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateValues {
    pub root_module: Option<StateModule>,
    pub outputs: BTreeMap<String, StateOutput>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateOutput {
    pub sensitive: bool,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateModule {
    pub address: String,
    pub resources: Vec<StateResource>,
    pub child_modules: Vec<StateModule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateResource {
    pub address: String,
    pub mode: ResourceMode,
    pub resource_type: String,
    pub name: String,
    pub index: Option<Value>,
    pub provider_name: String,
    pub schema_version: u64,
    pub value: Value,
    pub sensitive_values: Option<serde_json::Value>,
    pub depends_on: Vec<String>,
    pub tainted: bool,
    pub deposed_key: Option<String>,
}

impl State {
    /// Parses a JSON state document and types its values.
    pub fn from_json(raw_state: &str, schemas: &ProviderSchemas) -> Result<Self, StateError> {
        let raw: RawState = serde_json::from_str(raw_state)?;
        Self::from_raw(raw, schemas)
    }

    pub fn from_raw(raw: RawState, schemas: &ProviderSchemas) -> Result<Self, StateError> {
        check_format_version(&raw.format_version)?;

        let values = match raw.values {
            Some(values) => {
                let root_module = match &values.root_module {
                    Some(module) => Some(from_raw_module(module, schemas)?),
                    None => None,
                };
                let mut outputs = BTreeMap::new();
                for (name, output) in &values.outputs {
                    outputs.insert(name.clone(), from_raw_output(name, output)?);
                }
                Some(StateValues {
                    root_module,
                    outputs,
                })
            }
            None => None,
        };

        Ok(State {
            format_version: raw.format_version,
            terraform_version: raw.terraform_version,
            values,
        })
    }

    /// All resources of all modules, parents before children.
    pub fn resources(&self) -> Vec<&StateResource> {
        let mut resources = vec![];
        if let Some(module) = self.values.as_ref().and_then(|v| v.root_module.as_ref()) {
            collect_resources(module, &mut resources);
        }
        resources
    }
}

fn collect_resources<'a>(module: &'a StateModule, resources: &mut Vec<&'a StateResource>) {
    resources.extend(module.resources.iter());
    for child in &module.child_modules {
        collect_resources(child, resources);
    }
}

fn check_format_version(version: &str) -> Result<(), StateError> {
    let major = version.split('.').next().unwrap_or_default();
    match major {
        "0" | "1" => Ok(()),
        _ => Err(StateError::UnsupportedFormatVersion(version.to_string())),
    }
}

fn from_raw_module(
    module: &RawStateModule,
    schemas: &ProviderSchemas,
) -> Result<StateModule, StateError> {
    log::debug!(
        "converting module `{}` with {} resources",
        module.address,
        module.resources.len()
    );
    Ok(StateModule {
        address: module.address.clone(),
        resources: module
            .resources
            .iter()
            .map(|r| from_raw_resource(r, schemas))
            .collect::<Result<_, _>>()?,
        child_modules: module
            .child_modules
            .iter()
            .map(|m| from_raw_module(m, schemas))
            .collect::<Result<_, _>>()?,
    })
}

fn from_raw_output(name: &str, output: &RawStateOutput) -> Result<StateOutput, StateError> {
    let ty = output.output_type.clone().unwrap_or(Type::Dynamic);
    let value = unmarshal(&output.value, &ty).map_err(|source| StateError::Unmarshal {
        address: format!("output.{name}"),
        source,
    })?;
    Ok(StateOutput {
        sensitive: output.sensitive,
        value,
    })
}

fn from_raw_resource(
    resource: &RawStateResource,
    schemas: &ProviderSchemas,
) -> Result<StateResource, StateError> {
    let provider = schemas
        .schemas
        .get(&resource.provider_name)
        .ok_or_else(|| StateError::UnknownProvider {
            provider: resource.provider_name.clone(),
            address: resource.address.clone(),
        })?;
    let (kind, resource_schemas) = match resource.mode {
        ResourceMode::Managed => ("resource", &provider.resource_schemas),
        ResourceMode::Data => ("data source", &provider.data_source_schemas),
    };
    let schema = resource_schemas
        .get(&resource.resource_type)
        .ok_or_else(|| StateError::UnknownResourceType {
            kind,
            resource_type: resource.resource_type.clone(),
            provider: resource.provider_name.clone(),
        })?;

    let unmarshal_error = |source| StateError::Unmarshal {
        address: resource.address.clone(),
        source,
    };
    let value = unmarshal(&resource.attribute_values, &schema.block.implied_type())
        .map_err(unmarshal_error)?;
    let index = match &resource.index {
        Some(index) => Some(unmarshal(index, &Type::Dynamic).map_err(unmarshal_error)?),
        None => None,
    };

    Ok(StateResource {
        address: resource.address.clone(),
        mode: resource.mode,
        resource_type: resource.resource_type.clone(),
        name: resource.name.clone(),
        index,
        provider_name: resource.provider_name.clone(),
        schema_version: resource.schema_version,
        value,
        sensitive_values: resource.sensitive_values.clone(),
        depends_on: resource.depends_on.clone(),
        tainted: resource.tainted,
        deposed_key: resource.deposed_key.clone(),
    })
}
