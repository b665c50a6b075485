// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Schemas describe configuration-like data: a block holds attributes and
//! nested blocks, each nested block repeating per its nesting mode.
//!
//! They deserialize from the provider-schema JSON description:
//!
//! ```json
//! {
//!   "attributes": {
//!     "name": { "type": "string", "required": true },
//!     "tags": { "type": ["map", "string"], "optional": true },
//!     "rules": {
//!       "nested_type": {
//!         "nesting_mode": "list",
//!         "attributes": { "port": { "type": "number", "optional": true } }
//!       },
//!       "optional": true
//!     }
//!   },
//!   "block_types": {
//!     "timeouts": {
//!       "nesting_mode": "single",
//!       "block": { "attributes": { "create": { "type": "string", "optional": true } } }
//!     }
//!   }
//! }
//! ```
//!
//! Four operations are defined over schema nodes and agree with each other:
//!   - `implied_type` computes the structural type of the data a node describes.
//!   - `spec_type` is the same type annotated with optional object attributes.
//!   - `empty_value` is the canonical value of an absent node.
//!   - `decoder_spec` describes how to decode a configuration body into a value
//!     conforming to the implied type.
//!
//! Unknown fields in the description are ignored so that newer provider
//! descriptions keep loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Type;

pub mod decoder_spec;
pub mod empty_value;
pub mod implied_type;

#[cfg(test)]
mod tests {
    mod decoder_spec;
    mod empty_value;
    mod implied_type;
}

pub use decoder_spec::Spec;

/// Cardinality and shape policy of a nested block or nested attribute type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingMode {
    /// Zero or one instance, null when absent.
    #[default]
    Single,

    /// Exactly one instance that is always present. Only meaningful for
    /// blocks; a nested attribute type treats it as `Single`.
    Group,

    List,
    Set,

    /// Instances keyed by their single label.
    Map,
}

/// How an attribute participates in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

impl Requirement {
    /// Whether the attribute may be omitted from decoder input.
    pub fn is_omittable(self) -> bool {
        matches!(self, Requirement::Optional | Requirement::OptionalComputed)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<NestedAttributeType>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub computed: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedAttributeType {
    #[serde(default)]
    pub nesting_mode: NestingMode,

    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSchema {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeSchema>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub block_types: BTreeMap<String, NestedBlockSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedBlockSchema {
    #[serde(default)]
    pub nesting_mode: NestingMode,

    /// A missing block is the empty block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockSchema>,

    // Advisory only. Nothing in this crate enforces them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// What an attribute schema declares, after normalization.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AttributeKind<'a> {
    Typed(&'a Type),
    Nested(&'a NestedAttributeType),

    // Neither a type nor a nested type.
    Malformed,
}

impl AttributeSchema {
    pub fn typed(attribute_type: Type, requirement: Requirement) -> Self {
        AttributeSchema {
            attribute_type: Some(attribute_type),
            ..Default::default()
        }
        .with_requirement(requirement)
    }

    pub fn nested(nested_type: NestedAttributeType, requirement: Requirement) -> Self {
        AttributeSchema {
            nested_type: Some(nested_type),
            ..Default::default()
        }
        .with_requirement(requirement)
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.required = requirement == Requirement::Required;
        self.optional = requirement.is_omittable();
        self.computed = matches!(
            requirement,
            Requirement::Computed | Requirement::OptionalComputed
        );
        self
    }

    /// The requirement declared by the flags. `required` dominates the other
    /// flags. `None` when no flag is set.
    pub fn requirement(&self) -> Option<Requirement> {
        match (self.required, self.optional, self.computed) {
            (true, _, _) => Some(Requirement::Required),
            (false, true, true) => Some(Requirement::OptionalComputed),
            (false, true, false) => Some(Requirement::Optional),
            (false, false, true) => Some(Requirement::Computed),
            (false, false, false) => None,
        }
    }

    /// Whether the attribute may be omitted from decoder input.
    pub fn is_omittable(&self) -> bool {
        self.requirement().is_some_and(Requirement::is_omittable)
    }

    pub(crate) fn kind(&self) -> AttributeKind<'_> {
        match (&self.nested_type, &self.attribute_type) {
            (Some(nested), Some(t)) => {
                log::warn!("attribute declares both type {t} and a nested type; using the nested type");
                AttributeKind::Nested(nested)
            }
            (Some(nested), None) => AttributeKind::Nested(nested),
            (None, Some(t)) => AttributeKind::Typed(t),
            (None, None) => AttributeKind::Malformed,
        }
    }

    /// Logs flag combinations that `requirement` has to normalize.
    pub(crate) fn check_flags(&self, name: &str) {
        if self.required && (self.optional || self.computed) {
            log::warn!("attribute `{name}` is required and also optional or computed; treating it as required");
        }
    }
}

impl NestedAttributeType {
    pub fn new<I, K>(nesting_mode: NestingMode, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeSchema)>,
        K: Into<String>,
    {
        NestedAttributeType {
            nesting_mode,
            attributes: attributes.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        }
    }
}

impl BlockSchema {
    /// Parses a block from its provider-schema JSON description.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn with_block_type(mut self, name: impl Into<String>, block: NestedBlockSchema) -> Self {
        self.block_types.insert(name.into(), block);
        self
    }
}

impl NestedBlockSchema {
    pub fn new(nesting_mode: NestingMode, block: BlockSchema) -> Self {
        NestedBlockSchema {
            nesting_mode,
            block: Some(block),
            ..Default::default()
        }
    }

    pub fn with_items(mut self, min_items: Option<u64>, max_items: Option<u64>) -> Self {
        self.min_items = min_items;
        self.max_items = max_items;
        self
    }
}
