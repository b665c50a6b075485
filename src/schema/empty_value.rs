// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

use crate::schema::implied_type::{block_implied_type, nested_element_type, too_deep};
use crate::schema::*;
use crate::types::Type;
use crate::value::Value;

impl BlockSchema {
    /// The value of the block when nothing at all is configured: every
    /// attribute null and every nested block absent.
    pub fn empty_value(&self) -> Value {
        empty_block(Some(self), 0)
    }
}

impl NestedBlockSchema {
    pub fn empty_value(&self) -> Value {
        nested_block_empty_value(self, 0)
    }
}

impl AttributeSchema {
    /// `NoValue` when the attribute declares neither a type nor a nested
    /// type.
    pub fn empty_value(&self) -> Value {
        attribute_empty_value(self, 0)
    }
}

/// The empty value of a possibly missing block.
pub fn block_empty_value(block: Option<&BlockSchema>) -> Value {
    empty_block(block, 0)
}

fn empty_block(block: Option<&BlockSchema>, depth: usize) -> Value {
    if too_deep(depth) {
        return Value::null(Type::Dynamic);
    }
    let Some(block) = block else {
        return Value::empty_object();
    };

    let attributes = block.attributes.iter().map(|(name, attr)| {
        let v = match attribute_empty_value(attr, depth + 1) {
            // An object cannot hold the absence of a value.
            Value::NoValue => Value::null(Type::Dynamic),
            v => v,
        };
        (name.as_str(), v)
    });
    let blocks = block
        .block_types
        .iter()
        .map(|(name, nested)| (name.as_str(), nested_block_empty_value(nested, depth + 1)));

    Value::object(attributes.chain(blocks))
}

fn nested_block_empty_value(nested: &NestedBlockSchema, depth: usize) -> Value {
    match nested.nesting_mode {
        NestingMode::Single => Value::null(block_implied_type(nested.block.as_ref())),
        // Groups are always present.
        NestingMode::Group => empty_block(nested.block.as_ref(), depth),
        mode => empty_collection(mode, block_implied_type(nested.block.as_ref())),
    }
}

fn attribute_empty_value(attr: &AttributeSchema, depth: usize) -> Value {
    if too_deep(depth) {
        return Value::null(Type::Dynamic);
    }
    match attr.kind() {
        AttributeKind::Malformed => Value::NoValue,
        AttributeKind::Typed(t) => Value::null(t.without_optional_attrs()),
        AttributeKind::Nested(nested) => {
            let object = nested_element_type(nested, false);
            match nested.nesting_mode {
                NestingMode::Single | NestingMode::Group => Value::null(object),
                mode => empty_collection(mode, object),
            }
        }
    }
}

// Elements whose type has dynamic parts may differ from each other, so
// lists and sets degrade to the empty tuple and maps to the empty object.
fn empty_collection(mode: NestingMode, element: Type) -> Value {
    let dynamic = element.has_dynamic_types();
    match mode {
        NestingMode::List | NestingMode::Set if dynamic => Value::empty_tuple(),
        NestingMode::Map if dynamic => Value::empty_object(),
        NestingMode::List => Value::list_empty(element),
        NestingMode::Set => Value::set_empty(element),
        NestingMode::Map => Value::map_empty(element),
        NestingMode::Single | NestingMode::Group => Value::null(element),
    }
}
