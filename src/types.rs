// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! The structural type algebra.
//!
//! Types are plain immutable trees compared structurally. An object type may
//! carry a side set of optional attribute names; that annotation only matters
//! when a decoder checks input against a "spec type" and is stripped by
//! [`Type::without_optional_attrs`] to obtain the storage type.
//!
//! Types (de)serialize in the provider-schema JSON notation:
//!
//! ```json
//! "string"
//! ["list", "number"]
//! ["tuple", ["bool", "string"]]
//! ["object", {"name": "string", "size": "number"}, ["size"]]
//! "dynamic"
//! ```

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Bool,
    Number,
    String,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Tuple(Vec<Type>),
    Object(ObjectType),

    // Placeholder for a type decided by the data.
    Dynamic,
}

/// Attribute types of an object, plus the names of the attributes that may
/// be omitted from decoder input.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectType {
    attributes: BTreeMap<String, Type>,
    optional: BTreeSet<String>,
}

/// A place where a type does not conform to the type wanted of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConformanceError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl core::error::Error for ConformanceError {}

impl ObjectType {
    pub fn new(attributes: BTreeMap<String, Type>) -> Self {
        ObjectType {
            attributes,
            optional: BTreeSet::new(),
        }
    }

    /// Optional names that are not attributes are ignored.
    pub fn with_optional(attributes: BTreeMap<String, Type>, optional: BTreeSet<String>) -> Self {
        let optional = optional
            .into_iter()
            .filter(|name| attributes.contains_key(name))
            .collect();
        ObjectType {
            attributes,
            optional,
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, Type> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Type> {
        self.attributes.get(name)
    }

    pub fn optional_attributes(&self) -> &BTreeSet<String> {
        &self.optional
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.contains(name)
    }
}

impl Type {
    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Type {
        Type::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Type {
        Type::Map(Box::new(element))
    }

    pub fn tuple(elements: Vec<Type>) -> Type {
        Type::Tuple(elements)
    }

    pub fn object<I, K>(attributes: I) -> Type
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Object(ObjectType::new(
            attributes.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        ))
    }

    pub fn object_with_optional<I, K, O>(attributes: I, optional: O) -> Type
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Type::Object(ObjectType::with_optional(
            attributes.into_iter().map(|(k, t)| (k.into(), t)).collect(),
            optional.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn empty_object() -> Type {
        Type::Object(ObjectType::default())
    }

    pub fn empty_tuple() -> Type {
        Type::Tuple(vec![])
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Number | Type::String)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Dynamic)
    }

    /// Element type of a list, set or map.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(e) | Type::Set(e) | Type::Map(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            Type::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether `Dynamic` appears anywhere in the type, transitively.
    pub fn has_dynamic_types(&self) -> bool {
        match self {
            Type::Dynamic => true,
            Type::Bool | Type::Number | Type::String => false,
            Type::List(e) | Type::Set(e) | Type::Map(e) => e.has_dynamic_types(),
            Type::Tuple(elems) => elems.iter().any(Type::has_dynamic_types),
            Type::Object(o) => o.attributes.values().any(Type::has_dynamic_types),
        }
    }

    /// The storage type: the same shape with every optional-attribute
    /// annotation removed.
    pub fn without_optional_attrs(&self) -> Type {
        match self {
            Type::Bool | Type::Number | Type::String | Type::Dynamic => self.clone(),
            Type::List(e) => Type::list(e.without_optional_attrs()),
            Type::Set(e) => Type::set(e.without_optional_attrs()),
            Type::Map(e) => Type::map(e.without_optional_attrs()),
            Type::Tuple(elems) => Type::Tuple(elems.iter().map(Type::without_optional_attrs).collect()),
            Type::Object(o) => Type::Object(ObjectType::new(
                o.attributes
                    .iter()
                    .map(|(k, t)| (k.clone(), t.without_optional_attrs()))
                    .collect(),
            )),
        }
    }

    /// Checks that a value of type `self` is acceptable where `want` is
    /// expected. `Dynamic` accepts anything; everything else must match
    /// structurally. Optional-attribute annotations are not compared.
    pub fn test_conformance(&self, want: &Type) -> Vec<ConformanceError> {
        let mut errors = vec![];
        test_conformance(self, want, "", &mut errors);
        errors
    }

    pub fn conforms_to(&self, want: &Type) -> bool {
        self.test_conformance(want).is_empty()
    }

    /// Short name of the type's kind, for messages.
    pub fn friendly_name(&self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::Number => "number",
            Type::String => "string",
            Type::List(_) => "list",
            Type::Set(_) => "set",
            Type::Map(_) => "map",
            Type::Tuple(_) => "tuple",
            Type::Object(_) => "object",
            Type::Dynamic => "dynamic",
        }
    }
}

fn test_conformance(got: &Type, want: &Type, path: &str, errors: &mut Vec<ConformanceError>) {
    match (got, want) {
        (_, Type::Dynamic) => (),
        (Type::Bool, Type::Bool) | (Type::Number, Type::Number) | (Type::String, Type::String) => {
        }
        (Type::List(g), Type::List(w)) | (Type::Set(g), Type::Set(w)) | (Type::Map(g), Type::Map(w)) => {
            test_conformance(g, w, &format!("{path}[*]"), errors)
        }
        (Type::Tuple(g), Type::Tuple(w)) => {
            if g.len() != w.len() {
                errors.push(ConformanceError {
                    path: path.to_string(),
                    message: format!("tuple must have {} elements, not {}", w.len(), g.len()),
                });
                return;
            }
            for (idx, (g, w)) in g.iter().zip(w.iter()).enumerate() {
                test_conformance(g, w, &format!("{path}[{idx}]"), errors);
            }
        }
        (Type::Object(g), Type::Object(w)) => {
            for name in w.attributes.keys() {
                if !g.attributes.contains_key(name) {
                    errors.push(ConformanceError {
                        path: path.to_string(),
                        message: format!("attribute \"{name}\" is required"),
                    });
                }
            }
            for (name, g) in &g.attributes {
                match w.attributes.get(name) {
                    Some(w) => test_conformance(g, w, &format!("{path}.{name}"), errors),
                    None => errors.push(ConformanceError {
                        path: path.to_string(),
                        message: format!("unsupported attribute \"{name}\""),
                    }),
                }
            }
        }
        _ => errors.push(ConformanceError {
            path: path.to_string(),
            message: format!("{want} required, but got {got}"),
        }),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool | Type::Number | Type::String | Type::Dynamic => {
                f.write_str(self.friendly_name())
            }
            Type::List(e) => write!(f, "list({e})"),
            Type::Set(e) => write!(f, "set({e})"),
            Type::Map(e) => write!(f, "map({e})"),
            Type::Tuple(elems) => {
                f.write_str("tuple([")?;
                for (idx, e) in elems.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str("])")
            }
            Type::Object(o) => {
                f.write_str("object({")?;
                for (idx, (name, t)) in o.attributes.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    if o.is_optional(name) {
                        write!(f, "{name}=optional({t})")?;
                    } else {
                        write!(f, "{name}={t}")?;
                    }
                }
                f.write_str("})")
            }
        }
    }
}

impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Type::Bool | Type::Number | Type::String | Type::Dynamic => {
                serializer.serialize_str(self.friendly_name())
            }
            Type::List(e) | Type::Set(e) | Type::Map(e) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(self.friendly_name())?;
                seq.serialize_element(e)?;
                seq.end()
            }
            Type::Tuple(elems) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("tuple")?;
                seq.serialize_element(elems)?;
                seq.end()
            }
            Type::Object(o) => {
                let len = if o.optional.is_empty() { 2 } else { 3 };
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element("object")?;
                seq.serialize_element(&o.attributes)?;
                if !o.optional.is_empty() {
                    seq.serialize_element(&o.optional)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v: serde_json::Value = Deserialize::deserialize(deserializer)?;
        Type::from_json_value(&v).map_err(de::Error::custom)
    }
}

impl Type {
    /// Parses a type expression in provider-schema JSON notation.
    pub fn from_json_value(v: &serde_json::Value) -> Result<Type, String> {
        use serde_json::Value as Json;

        match v {
            Json::String(s) => match s.as_str() {
                "bool" => Ok(Type::Bool),
                "number" => Ok(Type::Number),
                "string" => Ok(Type::String),
                "dynamic" => Ok(Type::Dynamic),
                other => Err(format!("invalid primitive type name `{other}`")),
            },
            Json::Array(items) => {
                let kind = match items.first() {
                    Some(Json::String(kind)) => kind.as_str(),
                    _ => return Err("type constructor must start with its kind".to_string()),
                };
                let args = &items[1..];
                match (kind, args) {
                    ("list", [e]) => Ok(Type::list(Type::from_json_value(e)?)),
                    ("set", [e]) => Ok(Type::set(Type::from_json_value(e)?)),
                    ("map", [e]) => Ok(Type::map(Type::from_json_value(e)?)),
                    ("tuple", [Json::Array(elems)]) => Ok(Type::Tuple(
                        elems
                            .iter()
                            .map(Type::from_json_value)
                            .collect::<Result<_, _>>()?,
                    )),
                    ("object", [Json::Object(attrs)]) => Ok(Type::Object(ObjectType::new(
                        object_attributes(attrs)?,
                    ))),
                    ("object", [Json::Object(attrs), Json::Array(optional)]) => {
                        let attributes = object_attributes(attrs)?;
                        let mut names = BTreeSet::new();
                        for name in optional {
                            match name {
                                Json::String(name) if attributes.contains_key(name) => {
                                    names.insert(name.clone());
                                }
                                _ => {
                                    return Err(format!(
                                        "invalid optional attribute {name} in object type"
                                    ))
                                }
                            }
                        }
                        Ok(Type::Object(ObjectType::with_optional(attributes, names)))
                    }
                    _ => Err(format!("invalid `{kind}` type constructor")),
                }
            }
            _ => Err(format!("invalid type expression {v}")),
        }
    }
}

fn object_attributes(
    attrs: &serde_json::Map<String, serde_json::Value>,
) -> Result<BTreeMap<String, Type>, String> {
    attrs
        .iter()
        .map(|(k, v)| Ok((k.clone(), Type::from_json_value(v)?)))
        .collect()
}
