// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Decoder specifications built from schemas.
//!
//! A [`Spec`] tells [`crate::decode::decode`] which attributes and blocks of a
//! configuration body to read and how to shape them into a value. The value
//! produced for any body conforms to the implied type of the schema the spec
//! was built from.

use std::collections::BTreeMap;

use crate::schema::empty_value::block_empty_value;
use crate::schema::implied_type::too_deep;
use crate::schema::*;
use crate::types::Type;
use crate::value::Value;

/// Label name used for map blocks.
pub const MAP_BLOCK_LABEL: &str = "key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Spec {
    /// An object with one attribute per child spec.
    Object(BTreeMap<String, Spec>),

    /// A single attribute, converted to `ty`. `ty` may be a spec type;
    /// optional object attributes absent from the input become null.
    Attr {
        name: String,
        ty: Type,
        required: bool,
    },

    /// At most one block, null when absent.
    Block {
        type_name: String,
        nested: Box<Spec>,
        required: bool,
    },

    BlockList {
        type_name: String,
        nested: Box<Spec>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },

    BlockSet {
        type_name: String,
        nested: Box<Spec>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },

    /// Like `BlockList`, but instances may differ in type.
    BlockTuple {
        type_name: String,
        nested: Box<Spec>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },

    BlockMap {
        type_name: String,
        label_names: Vec<String>,
        nested: Box<Spec>,
    },

    /// Like `BlockMap`, but instances may differ in type.
    BlockObject {
        type_name: String,
        label_names: Vec<String>,
        nested: Box<Spec>,
    },

    /// `default` is used when `primary` decodes to null.
    Default { primary: Box<Spec>, default: Box<Spec> },

    Literal(Value),
}

impl Spec {
    /// The type of the values this spec decodes to.
    pub fn implied_type(&self) -> Type {
        match self {
            Spec::Object(children) => Type::object(
                children
                    .iter()
                    .map(|(name, spec)| (name.clone(), spec.implied_type())),
            ),
            Spec::Attr { ty, .. } => ty.without_optional_attrs(),
            Spec::Block { nested, .. } => nested.implied_type(),
            Spec::BlockList { nested, .. } => Type::list(nested.implied_type()),
            Spec::BlockSet { nested, .. } => Type::set(nested.implied_type()),
            Spec::BlockMap { nested, .. } => Type::map(nested.implied_type()),
            Spec::BlockTuple { .. } | Spec::BlockObject { .. } => Type::Dynamic,
            Spec::Default { primary, .. } => primary.implied_type(),
            Spec::Literal(v) => v.ty(),
        }
    }
}

impl BlockSchema {
    /// Spec decoding a body described by this block into an object.
    pub fn decoder_spec(&self) -> Spec {
        block_spec(Some(self), 0)
    }
}

impl AttributeSchema {
    /// Spec decoding the attribute `name` of a body.
    pub fn decoder_spec(&self, name: &str) -> Spec {
        attribute_spec(self, name, 0)
    }
}

impl NestedBlockSchema {
    /// Spec decoding the blocks of type `type_name` of a body.
    pub fn decoder_spec(&self, type_name: &str) -> Spec {
        nested_block_spec(self, type_name, 0)
    }
}

/// The decoder spec of a possibly missing block.
pub fn block_decoder_spec(block: Option<&BlockSchema>) -> Spec {
    block_spec(block, 0)
}

fn block_spec(block: Option<&BlockSchema>, depth: usize) -> Spec {
    if too_deep(depth) {
        return Spec::Literal(Value::null(Type::Dynamic));
    }
    let Some(block) = block else {
        return Spec::Object(BTreeMap::new());
    };

    let mut children = BTreeMap::new();
    for (name, attr) in &block.attributes {
        children.insert(name.clone(), attribute_spec(attr, name, depth + 1));
    }
    for (name, nested) in &block.block_types {
        children.insert(name.clone(), nested_block_spec(nested, name, depth + 1));
    }
    Spec::Object(children)
}

fn attribute_spec(attr: &AttributeSchema, name: &str, depth: usize) -> Spec {
    if too_deep(depth) {
        return Spec::Attr {
            name: name.to_string(),
            ty: Type::Dynamic,
            required: false,
        };
    }

    let required = attr.required;
    match attr.kind() {
        AttributeKind::Malformed => Spec::Literal(Value::NoValue),
        AttributeKind::Typed(t) => Spec::Attr {
            name: name.to_string(),
            ty: t.clone(),
            required,
        },
        AttributeKind::Nested(nested) => {
            let primary = Spec::Attr {
                name: name.to_string(),
                ty: nested.spec_type(),
                required,
            };
            let empty = attr.empty_value();
            if required || empty.is_null() {
                return primary;
            }
            // Absent collections decode to their empty value.
            Spec::Default {
                primary: Box::new(primary),
                default: Box::new(Spec::Literal(empty)),
            }
        }
    }
}

fn nested_block_spec(nested: &NestedBlockSchema, type_name: &str, depth: usize) -> Spec {
    let inner = block_spec(nested.block.as_ref(), depth);
    let dynamic = inner.implied_type().has_dynamic_types();
    let type_name = type_name.to_string();
    let nested_spec = Box::new(inner);

    match nested.nesting_mode {
        NestingMode::Single => Spec::Block {
            type_name,
            nested: nested_spec,
            required: false,
        },
        NestingMode::Group => Spec::Default {
            primary: Box::new(Spec::Block {
                type_name,
                nested: nested_spec,
                required: false,
            }),
            default: Box::new(Spec::Literal(block_empty_value(nested.block.as_ref()))),
        },
        NestingMode::List | NestingMode::Set if dynamic => Spec::BlockTuple {
            type_name,
            nested: nested_spec,
            min_items: nested.min_items,
            max_items: nested.max_items,
        },
        NestingMode::List => Spec::BlockList {
            type_name,
            nested: nested_spec,
            min_items: nested.min_items,
            max_items: nested.max_items,
        },
        NestingMode::Set => Spec::BlockSet {
            type_name,
            nested: nested_spec,
            min_items: nested.min_items,
            max_items: nested.max_items,
        },
        NestingMode::Map if dynamic => Spec::BlockObject {
            type_name,
            label_names: vec![MAP_BLOCK_LABEL.to_string()],
            nested: nested_spec,
        },
        NestingMode::Map => Spec::BlockMap {
            type_name,
            label_names: vec![MAP_BLOCK_LABEL.to_string()],
            nested: nested_spec,
        },
    }
}
