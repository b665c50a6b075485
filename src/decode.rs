// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Decoding of configuration bodies driven by a [`Spec`].
//!
//! Decoding never fails. Problems with the input are reported as
//! [`Diagnostic`]s next to a best-effort value that still has the type the
//! spec implies.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::Spec;
use crate::types::Type;
use crate::value::Value;
use crate::Rc;

mod body;
pub mod convert;
mod diagnostic;

pub use body::{Attribute, Block, Body, BodyContent, Expression, Pos, Range, UnknownBody};
pub use convert::convert;
pub use diagnostic::{Diagnostic, Diagnostics, Severity};

/// The attribute names and block types a spec reads from a body. Block types
/// map to their number of labels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BodySchema {
    pub attributes: BTreeSet<String>,
    pub blocks: BTreeMap<String, usize>,
}

/// Lists what `spec` reads from the body it is applied to. Nested block
/// bodies are not included.
pub fn implied_schema(spec: &Spec) -> BodySchema {
    let mut schema = BodySchema::default();
    collect_schema(spec, &mut schema);
    schema
}

fn collect_schema(spec: &Spec, schema: &mut BodySchema) {
    match spec {
        Spec::Object(children) => children.values().for_each(|c| collect_schema(c, schema)),
        Spec::Attr { name, .. } => {
            schema.attributes.insert(name.clone());
        }
        Spec::Block { type_name, .. }
        | Spec::BlockList { type_name, .. }
        | Spec::BlockSet { type_name, .. }
        | Spec::BlockTuple { type_name, .. } => {
            schema.blocks.insert(type_name.clone(), 0);
        }
        Spec::BlockMap {
            type_name,
            label_names,
            ..
        }
        | Spec::BlockObject {
            type_name,
            label_names,
            ..
        } => {
            schema.blocks.insert(type_name.clone(), label_names.len());
        }
        Spec::Default { primary, default } => {
            collect_schema(primary, schema);
            collect_schema(default, schema);
        }
        Spec::Literal(_) => (),
    }
}

/// Decodes `body` as described by `spec`.
pub fn decode(body: &dyn Body, spec: &Spec) -> (Value, Diagnostics) {
    log::debug!("decoding body");
    let mut diags = Diagnostics::new();
    let value = decode_body(body, spec, &mut diags);
    (value, diags)
}

fn decode_body(body: &dyn Body, spec: &Spec, diags: &mut Diagnostics) -> Value {
    let content = body.content();
    check_extraneous(content, &implied_schema(spec), diags);
    decode_content(content, spec, diags)
}

fn check_extraneous(content: &BodyContent, schema: &BodySchema, diags: &mut Diagnostics) {
    for (name, attr) in &content.attributes {
        if !schema.attributes.contains(name) {
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{name}\" is not expected here."),
                )
                .with_subject(attr.range.clone()),
            );
        }
    }
    for block in &content.blocks {
        if !schema.blocks.contains_key(&block.type_name) {
            diags.push(
                Diagnostic::error(
                    "Unsupported block type",
                    format!(
                        "Blocks of type \"{}\" are not expected here.",
                        block.type_name
                    ),
                )
                .with_subject(block.range.clone()),
            );
        }
    }
}

fn blocks_of<'a>(content: &'a BodyContent, type_name: &'a str) -> impl Iterator<Item = &'a Block> {
    content
        .blocks
        .iter()
        .filter(move |b| b.type_name == type_name)
}

fn decode_content(content: &BodyContent, spec: &Spec, diags: &mut Diagnostics) -> Value {
    match spec {
        Spec::Object(children) => Value::object(children.iter().map(|(name, child)| {
            let v = match decode_content(content, child, diags) {
                Value::NoValue => Value::null(Type::Dynamic),
                v => v,
            };
            (name.as_str(), v)
        })),

        Spec::Attr { name, ty, required } => decode_attribute(content, name, ty, *required, diags),

        Spec::Block {
            type_name,
            nested,
            required,
        } => {
            let mut blocks = blocks_of(content, type_name);
            let Some(first) = blocks.next() else {
                if *required {
                    diags.push(Diagnostic::error(
                        format!("Missing {type_name} block"),
                        format!("A block of type \"{type_name}\" is required here."),
                    ));
                }
                return Value::null(nested.implied_type());
            };
            for duplicate in blocks {
                diags.push(
                    Diagnostic::error(
                        format!("Duplicate {type_name} block"),
                        format!("Only one block of type \"{type_name}\" is allowed."),
                    )
                    .with_subject(duplicate.range.clone()),
                );
            }
            if first.body.is_unknown() {
                return Value::unknown(nested.implied_type());
            }
            decode_body(first.body.as_ref(), nested, diags)
        }

        // Item bounds are not checked: unknown bodies may expand to any
        // number of blocks.
        Spec::BlockList {
            type_name, nested, ..
        } => match decode_blocks(content, type_name, nested, diags) {
            Some(elems) => Value::list(nested.implied_type(), elems),
            None => Value::unknown(Type::list(nested.implied_type())),
        },
        Spec::BlockSet {
            type_name, nested, ..
        } => match decode_blocks(content, type_name, nested, diags) {
            Some(elems) => Value::set(nested.implied_type(), elems),
            None => Value::unknown(Type::set(nested.implied_type())),
        },
        Spec::BlockTuple {
            type_name, nested, ..
        } => match decode_blocks(content, type_name, nested, diags) {
            Some(elems) => Value::tuple(elems),
            None => Value::unknown(Type::Dynamic),
        },

        Spec::BlockMap {
            type_name,
            label_names,
            nested,
        } => match decode_labeled_blocks(content, type_name, label_names, nested, diags) {
            Some(entries) => Value::Map(nested.implied_type(), Rc::new(entries)),
            None => Value::unknown(Type::map(nested.implied_type())),
        },
        Spec::BlockObject {
            type_name,
            label_names,
            nested,
        } => match decode_labeled_blocks(content, type_name, label_names, nested, diags) {
            Some(entries) => Value::Object(Rc::new(entries)),
            None => Value::unknown(Type::Dynamic),
        },

        Spec::Default { primary, default } => match decode_content(content, primary, diags) {
            v if v.is_null() => decode_content(content, default, diags),
            v => v,
        },

        Spec::Literal(v) => v.clone(),
    }
}

fn decode_attribute(
    content: &BodyContent,
    name: &str,
    ty: &Type,
    required: bool,
    diags: &mut Diagnostics,
) -> Value {
    let Some(attr) = content.attributes.get(name) else {
        if required {
            diags.push(Diagnostic::error(
                "Missing required argument",
                format!("The argument \"{name}\" is required, but no definition was found."),
            ));
        }
        return Value::null(ty.without_optional_attrs());
    };

    match convert(&attr.expr.value, ty) {
        Ok(v) => v,
        Err(e) => {
            diags.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!("Inappropriate value for attribute \"{name}\": {e}."),
                )
                .with_subject(attr.expr.range.clone()),
            );
            Value::unknown(ty.without_optional_attrs())
        }
    }
}

// `None` when any of the blocks is unknown.
fn decode_blocks(
    content: &BodyContent,
    type_name: &str,
    nested: &Spec,
    diags: &mut Diagnostics,
) -> Option<Vec<Value>> {
    let blocks: Vec<&Block> = blocks_of(content, type_name).collect();
    if blocks.iter().any(|b| b.body.is_unknown()) {
        log::debug!("{type_name} blocks have an unknown body");
        return None;
    }
    Some(
        blocks
            .into_iter()
            .map(|b| decode_body(b.body.as_ref(), nested, diags))
            .collect(),
    )
}

fn decode_labeled_blocks(
    content: &BodyContent,
    type_name: &str,
    label_names: &[String],
    nested: &Spec,
    diags: &mut Diagnostics,
) -> Option<BTreeMap<Rc<str>, Value>> {
    let blocks: Vec<&Block> = blocks_of(content, type_name).collect();
    if blocks.iter().any(|b| b.body.is_unknown()) {
        log::debug!("{type_name} blocks have an unknown body");
        return None;
    }

    let mut entries = BTreeMap::new();
    for block in blocks {
        let key = match block.labels.as_slice() {
            [key] if label_names.len() == 1 => key,
            labels => {
                diags.push(
                    Diagnostic::error(
                        format!("Wrong number of labels for {type_name} block"),
                        format!(
                            "Blocks of type \"{type_name}\" need {} label(s) ({}), but {} were given.",
                            label_names.len(),
                            label_names.join(", "),
                            labels.len()
                        ),
                    )
                    .with_subject(block.range.clone()),
                );
                continue;
            }
        };
        // Later blocks replace earlier ones with the same label.
        let v = decode_body(block.body.as_ref(), nested, diags);
        entries.insert(Rc::from(key.as_str()), v);
    }
    Some(entries)
}
