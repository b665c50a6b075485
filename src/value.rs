// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::types::Type;
use crate::Rc;

use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::ops;

use anyhow::{anyhow, Result};
use serde::ser::{Error, SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;

// Every value knows its type exactly: collections record their element type
// so that empty ones are still typed, while tuples and objects derive theirs
// from their elements.
// BTree is used for sets and objects so that values have a total order and
// sets compare independently of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    // Known type, no value.
    Null(Type),

    // Known type, value not determinable yet.
    Unknown(Type),

    // Produced only for an attribute schema with neither a type nor a nested
    // type. Distinct from `Null(Type::Dynamic)`.
    NoValue,

    Bool(bool),
    Number(Number),
    String(Rc<str>),

    List(Type, Rc<Vec<Value>>),
    Set(Type, Rc<BTreeSet<Value>>),
    Map(Type, Rc<BTreeMap<Rc<str>, Value>>),

    Tuple(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<Rc<str>, Value>>),
}

impl Value {
    pub fn null(t: Type) -> Value {
        Value::Null(t)
    }

    pub fn unknown(t: Type) -> Value {
        Value::Unknown(t)
    }

    pub fn list(element_type: Type, elements: Vec<Value>) -> Value {
        Value::List(element_type, Rc::new(elements))
    }

    pub fn list_empty(element_type: Type) -> Value {
        Value::list(element_type, vec![])
    }

    pub fn set<I: IntoIterator<Item = Value>>(element_type: Type, elements: I) -> Value {
        Value::Set(element_type, Rc::new(elements.into_iter().collect()))
    }

    pub fn set_empty(element_type: Type) -> Value {
        Value::Set(element_type, Rc::new(BTreeSet::new()))
    }

    pub fn map<I, K>(element_type: Type, elements: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Rc<str>>,
    {
        Value::Map(
            element_type,
            Rc::new(elements.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        )
    }

    pub fn map_empty(element_type: Type) -> Value {
        Value::Map(element_type, Rc::new(BTreeMap::new()))
    }

    pub fn tuple(elements: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(elements))
    }

    pub fn empty_tuple() -> Value {
        Value::tuple(vec![])
    }

    pub fn object<I, K>(attributes: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Rc<str>>,
    {
        Value::Object(Rc::new(
            attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn empty_object() -> Value {
        Value::Object(Rc::new(BTreeMap::new()))
    }

    /// The exact type of this value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null(t) | Value::Unknown(t) => t.clone(),
            Value::NoValue => Type::Dynamic,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::List(e, _) => Type::list(e.clone()),
            Value::Set(e, _) => Type::set(e.clone()),
            Value::Map(e, _) => Type::map(e.clone()),
            Value::Tuple(elems) => Type::Tuple(elems.iter().map(Value::ty).collect()),
            Value::Object(attrs) => {
                Type::object(attrs.iter().map(|(k, v)| (k.to_string(), v.ty())))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self, Value::NoValue)
    }

    /// Whether neither this value nor anything nested in it is unknown.
    pub fn is_wholly_known(&self) -> bool {
        match self {
            Value::Unknown(_) => false,
            Value::List(_, elems) | Value::Tuple(elems) => elems.iter().all(Value::is_wholly_known),
            Value::Set(_, elems) => elems.iter().all(Value::is_wholly_known),
            Value::Map(_, attrs) | Value::Object(attrs) => {
                attrs.values().all(Value::is_wholly_known)
            }
            _ => true,
        }
    }

    /// Number of elements of a collection, tuple or object.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(_, elems) | Value::Tuple(elems) => Some(elems.len()),
            Value::Set(_, elems) => Some(elems.len()),
            Value::Map(_, attrs) | Value::Object(attrs) => Some(attrs.len()),
            _ => None,
        }
    }

    /// Checks that the value can stand where `want` is expected.
    ///
    /// Beyond type conformance this accepts the degraded empty shapes used
    /// when an element type has dynamic types: an empty tuple for a list or
    /// set, and an empty object for a map.
    pub fn conforms_to(&self, want: &Type) -> bool {
        match (self, want) {
            (_, Type::Dynamic) => true,
            (Value::NoValue, _) => false,
            (Value::Null(t) | Value::Unknown(t), _) => t.conforms_to(want),
            (Value::Bool(_), Type::Bool)
            | (Value::Number(_), Type::Number)
            | (Value::String(_), Type::String) => true,
            (Value::Tuple(elems), Type::List(e) | Type::Set(e))
                if elems.is_empty() && e.has_dynamic_types() =>
            {
                true
            }
            (Value::Object(attrs), Type::Map(e)) if attrs.is_empty() && e.has_dynamic_types() => {
                true
            }
            (Value::List(et, elems), Type::List(e)) => {
                et.conforms_to(e) && elems.iter().all(|v| v.conforms_to(e))
            }
            (Value::Set(et, elems), Type::Set(e)) => {
                et.conforms_to(e) && elems.iter().all(|v| v.conforms_to(e))
            }
            (Value::Map(et, attrs), Type::Map(e)) => {
                et.conforms_to(e) && attrs.values().all(|v| v.conforms_to(e))
            }
            (Value::Tuple(elems), Type::Tuple(types)) => {
                elems.len() == types.len()
                    && elems.iter().zip(types.iter()).all(|(v, t)| v.conforms_to(t))
            }
            (Value::Object(attrs), Type::Object(o)) => {
                attrs.len() == o.attributes().len()
                    && attrs.iter().all(|(k, v)| match o.attribute(k) {
                        Some(t) => v.conforms_to(t),
                        None => false,
                    })
            }
            _ => false,
        }
    }
}

impl Value {
    pub fn as_bool(&self) -> Result<&bool> {
        match self {
            Value::Bool(b) => Ok(b),
            _ => Err(anyhow!("not a bool")),
        }
    }

    pub fn as_string(&self) -> Result<&Rc<str>> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(anyhow!("not a string")),
        }
    }

    pub fn as_number(&self) -> Result<&Number> {
        match self {
            Value::Number(n) => Ok(n),
            _ => Err(anyhow!("not a number")),
        }
    }

    /// Elements of a list or tuple.
    pub fn as_elements(&self) -> Result<&Vec<Value>> {
        match self {
            Value::List(_, elems) | Value::Tuple(elems) => Ok(elems),
            _ => Err(anyhow!("not a list or tuple")),
        }
    }

    pub fn as_set(&self) -> Result<&BTreeSet<Value>> {
        match self {
            Value::Set(_, elems) => Ok(elems),
            _ => Err(anyhow!("not a set")),
        }
    }

    /// Entries of a map or attributes of an object.
    pub fn as_object(&self) -> Result<&BTreeMap<Rc<str>, Value>> {
        match self {
            Value::Map(_, attrs) | Value::Object(attrs) => Ok(attrs),
            _ => Err(anyhow!("not a map or object")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(Number::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::from(n))
    }
}

// Generic form: what a JSON parser would hand back. Nulls and unknowns both
// become null; sets, lists and tuples become arrays.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null(_) | Value::Unknown(_) => serializer.serialize_none(),
            Value::NoValue => Err(S::Error::custom("cannot serialize the absence of a value")),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s.as_ref()),
            Value::List(_, elems) | Value::Tuple(elems) => {
                let mut seq = serializer.serialize_seq(Some(elems.len()))?;
                for e in elems.iter() {
                    seq.serialize_element(e)?;
                }
                seq.end()
            }
            Value::Set(_, elems) => {
                let mut seq = serializer.serialize_seq(Some(elems.len()))?;
                for e in elems.iter() {
                    seq.serialize_element(e)?;
                }
                seq.end()
            }
            Value::Map(_, attrs) | Value::Object(attrs) => {
                let mut map = serializer.serialize_map(Some(attrs.len()))?;
                for (k, v) in attrs.iter() {
                    map.serialize_entry(k.as_ref(), v)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::NoValue => f.write_str("<no value>"),
            Value::Unknown(t) => write!(f, "<unknown {t}>"),
            _ => match serde_json::to_string(self) {
                Ok(s) => write!(f, "{s}"),
                Err(_e) => Err(fmt::Error),
            },
        }
    }
}

impl ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Self::Output {
        match self.as_elements() {
            Ok(a) if index < a.len() => &a[index],
            _ => &Value::NoValue,
        }
    }
}

impl ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        match self.as_object() {
            Ok(attrs) => attrs.get(key).unwrap_or(&Value::NoValue),
            _ => &Value::NoValue,
        }
    }
}
