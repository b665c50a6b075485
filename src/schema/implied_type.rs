// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Structural types implied by schema nodes.
//!
//! Two flavors are computed by the same recursion. The storage type is what
//! values are kept as. The spec type has the same shape, with object
//! attributes that may be omitted from configuration marked optional.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::*;
use crate::types::{ObjectType, Type};
use crate::MAX_SCHEMA_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Storage,
    Spec,
}

impl BlockSchema {
    /// The object type of the data this block describes.
    pub fn implied_type(&self) -> Type {
        log::trace!("computing implied type of block");
        block_type(Some(self), Flavor::Storage, 0)
    }

    /// Like [`BlockSchema::implied_type`], with omittable attributes marked
    /// optional.
    pub fn spec_type(&self) -> Type {
        block_type(Some(self), Flavor::Spec, 0)
    }

    /// Names of the attributes that configuration may leave out.
    pub fn optional_attributes(&self) -> BTreeSet<String> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.is_omittable())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl NestedBlockSchema {
    /// List, set and map blocks whose content has dynamic types imply
    /// `Dynamic`: instances may differ in type, so the decoded value is a
    /// tuple or an object rather than a collection.
    pub fn implied_type(&self) -> Type {
        nested_block_type(self, Flavor::Storage, 0)
    }

    pub fn spec_type(&self) -> Type {
        nested_block_type(self, Flavor::Spec, 0)
    }
}

impl AttributeSchema {
    pub fn implied_type(&self) -> Type {
        attribute_type(self, Flavor::Storage, 0)
    }

    pub fn spec_type(&self) -> Type {
        attribute_type(self, Flavor::Spec, 0)
    }
}

impl NestedAttributeType {
    pub fn implied_type(&self) -> Type {
        nested_attribute_type(Some(self), Flavor::Storage, 0)
    }

    pub fn spec_type(&self) -> Type {
        nested_attribute_type(Some(self), Flavor::Spec, 0)
    }
}

/// The implied type of a possibly missing block. A missing block is the
/// empty object.
pub fn block_implied_type(block: Option<&BlockSchema>) -> Type {
    block_type(block, Flavor::Storage, 0)
}

/// The implied type of a possibly missing nested attribute type.
pub fn nested_attribute_implied_type(nested: Option<&NestedAttributeType>) -> Type {
    nested_attribute_type(nested, Flavor::Storage, 0)
}

pub(crate) fn too_deep(depth: usize) -> bool {
    if depth > MAX_SCHEMA_DEPTH {
        log::warn!("schema nested deeper than {MAX_SCHEMA_DEPTH} levels; cutting off");
        return true;
    }
    false
}

fn block_type(block: Option<&BlockSchema>, flavor: Flavor, depth: usize) -> Type {
    if too_deep(depth) {
        return Type::Dynamic;
    }
    let Some(block) = block else {
        return Type::empty_object();
    };

    let mut attributes = BTreeMap::new();
    let mut optional = BTreeSet::new();
    for (name, attr) in &block.attributes {
        attr.check_flags(name);
        attributes.insert(name.clone(), attribute_type(attr, flavor, depth + 1));
        if flavor == Flavor::Spec && attr.is_omittable() {
            optional.insert(name.clone());
        }
    }
    for (name, nested) in &block.block_types {
        attributes.insert(name.clone(), nested_block_type(nested, flavor, depth + 1));
    }

    Type::Object(ObjectType::with_optional(attributes, optional))
}

fn nested_block_type(nested: &NestedBlockSchema, flavor: Flavor, depth: usize) -> Type {
    let inner = block_type(nested.block.as_ref(), flavor, depth);
    match nested.nesting_mode {
        NestingMode::Single | NestingMode::Group => inner,
        NestingMode::List | NestingMode::Set | NestingMode::Map if inner.has_dynamic_types() => {
            log::debug!(
                "{:?} block with dynamic types implies a dynamic type",
                nested.nesting_mode
            );
            Type::Dynamic
        }
        NestingMode::List => Type::list(inner),
        NestingMode::Set => Type::set(inner),
        NestingMode::Map => Type::map(inner),
    }
}

fn attribute_type(attr: &AttributeSchema, flavor: Flavor, depth: usize) -> Type {
    match attr.kind() {
        AttributeKind::Typed(t) => match flavor {
            Flavor::Storage => t.without_optional_attrs(),
            Flavor::Spec => t.clone(),
        },
        AttributeKind::Nested(nested) => nested_attribute_type(Some(nested), flavor, depth),
        AttributeKind::Malformed => Type::Dynamic,
    }
}

fn nested_attribute_type(
    nested: Option<&NestedAttributeType>,
    flavor: Flavor,
    depth: usize,
) -> Type {
    let Some(nested) = nested else {
        return Type::empty_object();
    };
    let object = nested_object_type(nested, flavor, depth);

    // Collections of objects with dynamic types keep their declared shape;
    // the concrete types are settled by the data.
    match nested.nesting_mode {
        NestingMode::Single | NestingMode::Group => object,
        NestingMode::List => Type::list(object),
        NestingMode::Set => Type::set(object),
        NestingMode::Map => Type::map(object),
    }
}

/// The object type of one instance of a nested attribute type, whatever its
/// nesting mode. `spec` selects the spec type flavor.
pub(crate) fn nested_element_type(nested: &NestedAttributeType, spec: bool) -> Type {
    let flavor = if spec { Flavor::Spec } else { Flavor::Storage };
    nested_object_type(nested, flavor, 0)
}

fn nested_object_type(nested: &NestedAttributeType, flavor: Flavor, depth: usize) -> Type {
    if too_deep(depth) {
        return Type::Dynamic;
    }

    let mut attributes = BTreeMap::new();
    let mut optional = BTreeSet::new();
    for (name, attr) in &nested.attributes {
        attr.check_flags(name);
        attributes.insert(name.clone(), attribute_type(attr, flavor, depth + 1));
        if flavor == Flavor::Spec && attr.is_omittable() {
            optional.insert(name.clone());
        }
    }
    Type::Object(ObjectType::with_optional(attributes, optional))
}
