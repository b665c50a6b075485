// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Type directed unmarshalling of generic data.
//!
//! Generic data is what a JSON or YAML parser produces without knowing the
//! wanted type: scalars, sequences and string keyed mappings. Unmarshalling
//! reshapes it into a [`Value`] of a given [`Type`]. Where the type is
//! `Dynamic` the type is inferred from the data itself: mappings become
//! objects and sequences become tuples.

use std::collections::BTreeMap;

use crate::number::Number;
use crate::types::Type;
use crate::value::Value;
use crate::{Rc, MAX_SCHEMA_DEPTH};

mod error;

pub use error::UnmarshalError;

type Result<T> = core::result::Result<T, UnmarshalError>;

/// A key of a generic mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKey<'a> {
    String(&'a str),

    /// A key that is not a string, with the name of its kind.
    Other(&'static str),
}

/// One level of generic data.
#[derive(Debug)]
pub enum Shape<'a, D> {
    Null,
    Bool(bool),

    /// Number literal text, exactly as parsed.
    Number(String),

    String(&'a str),
    Sequence(&'a [D]),
    Mapping(Vec<(MapKey<'a>, &'a D)>),
}

impl<D> Shape<'_, D> {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool(_) => "bool",
            Shape::Number(_) => "number",
            Shape::String(_) => "string",
            Shape::Sequence(_) => "sequence",
            Shape::Mapping(_) => "mapping",
        }
    }
}

/// Parsed data without type annotations.
pub trait GenericData: Sized {
    fn shape(&self) -> Shape<'_, Self>;
}

impl GenericData for serde_json::Value {
    fn shape(&self) -> Shape<'_, Self> {
        use serde_json::Value as Json;
        match self {
            Json::Null => Shape::Null,
            Json::Bool(b) => Shape::Bool(*b),
            Json::Number(n) => Shape::Number(n.to_string()),
            Json::String(s) => Shape::String(s),
            Json::Array(items) => Shape::Sequence(items),
            Json::Object(fields) => Shape::Mapping(
                fields
                    .iter()
                    .map(|(k, v)| (MapKey::String(k.as_str()), v))
                    .collect(),
            ),
        }
    }
}

#[cfg(feature = "yaml")]
impl GenericData for serde_yaml::Value {
    fn shape(&self) -> Shape<'_, Self> {
        use serde_yaml::Value as Yaml;
        match self {
            Yaml::Null => Shape::Null,
            Yaml::Bool(b) => Shape::Bool(*b),
            Yaml::Number(n) => Shape::Number(n.to_string()),
            Yaml::String(s) => Shape::String(s),
            Yaml::Sequence(items) => Shape::Sequence(items),
            Yaml::Mapping(fields) => Shape::Mapping(
                fields
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Yaml::String(s) => MapKey::String(s.as_str()),
                            Yaml::Null => MapKey::Other("null"),
                            Yaml::Bool(_) => MapKey::Other("bool"),
                            Yaml::Number(_) => MapKey::Other("number"),
                            Yaml::Sequence(_) => MapKey::Other("sequence"),
                            Yaml::Mapping(_) => MapKey::Other("mapping"),
                            Yaml::Tagged(_) => MapKey::Other("tagged value"),
                        };
                        (key, v)
                    })
                    .collect(),
            ),
            // Tags carry no type information here.
            Yaml::Tagged(tagged) => tagged.value.shape(),
        }
    }
}

/// Unmarshals parsed JSON into a value of type `ty`.
pub fn unmarshal(data: &serde_json::Value, ty: &Type) -> Result<Value> {
    log::debug!("unmarshalling JSON data as {ty}");
    unmarshal_data(data, ty)
}

/// Unmarshals parsed YAML into a value of type `ty`.
#[cfg(feature = "yaml")]
pub fn unmarshal_yaml(data: &serde_yaml::Value, ty: &Type) -> Result<Value> {
    log::debug!("unmarshalling YAML data as {ty}");
    unmarshal_data(data, ty)
}

/// Unmarshals any generic data into a value of type `ty`.
pub fn unmarshal_data<D: GenericData>(data: &D, ty: &Type) -> Result<Value> {
    unmarshal_at(data, ty, "$", 0)
}

fn unmarshal_at<D: GenericData>(data: &D, want: &Type, path: &str, depth: usize) -> Result<Value> {
    if depth > MAX_SCHEMA_DEPTH {
        log::warn!("data at {path} nested deeper than {MAX_SCHEMA_DEPTH} levels");
        return Err(UnmarshalError::DepthExceeded {
            path: path.to_string(),
            limit: MAX_SCHEMA_DEPTH,
        });
    }

    match (data.shape(), want) {
        (Shape::Null, _) => Ok(Value::null(want.clone())),
        (shape, Type::Dynamic) => infer(shape, path, depth),

        (Shape::Bool(b), Type::Bool) => Ok(Value::from(b)),
        (Shape::Number(literal), Type::Number) => number(literal, path),
        (Shape::String(s), Type::String) => Ok(Value::from(s)),

        (Shape::Sequence(items), Type::List(e)) => {
            let elems = elements(items, e, path, depth)?;
            Ok(Value::list((**e).clone(), elems))
        }
        (Shape::Sequence(items), Type::Set(e)) => {
            let elems = elements(items, e, path, depth)?;
            Ok(Value::set((**e).clone(), elems))
        }
        (Shape::Sequence(items), Type::Tuple(types)) => {
            if items.len() != types.len() {
                return Err(UnmarshalError::TupleLength {
                    path: path.to_string(),
                    expected: types.len(),
                    actual: items.len(),
                });
            }
            let elems = items
                .iter()
                .zip(types.iter())
                .enumerate()
                .map(|(idx, (item, t))| unmarshal_at(item, t, &format!("{path}[{idx}]"), depth + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::tuple(elems))
        }

        (Shape::Mapping(entries), Type::Map(e)) => {
            let mut map: BTreeMap<Rc<str>, Value> = BTreeMap::new();
            for (key, item) in entries {
                let key = string_key(key, path)?;
                let v = unmarshal_at(item, e, &format!("{path}[\"{key}\"]"), depth + 1)?;
                map.insert(Rc::from(key), v);
            }
            Ok(Value::Map((**e).clone(), Rc::new(map)))
        }
        (Shape::Mapping(entries), Type::Object(o)) => {
            let mut fields: BTreeMap<Rc<str>, Value> = BTreeMap::new();
            for (key, item) in entries {
                let key = string_key(key, path)?;
                let Some(t) = o.attribute(key) else {
                    return Err(UnmarshalError::UnexpectedAttribute {
                        path: path.to_string(),
                        name: key.to_string(),
                    });
                };
                let v = unmarshal_at(item, t, &format!("{path}.{key}"), depth + 1)?;
                fields.insert(Rc::from(key), v);
            }
            if let Some(name) = o
                .attributes()
                .keys()
                .find(|name| !fields.contains_key(name.as_str()))
            {
                return Err(UnmarshalError::MissingAttribute {
                    path: path.to_string(),
                    name: name.clone(),
                });
            }
            Ok(Value::Object(Rc::new(fields)))
        }

        (shape, _) => Err(UnmarshalError::TypeMismatch {
            path: path.to_string(),
            expected: want.friendly_name().to_string(),
            actual: shape.kind().to_string(),
        }),
    }
}

// The data decides the type.
fn infer<D: GenericData>(shape: Shape<'_, D>, path: &str, depth: usize) -> Result<Value> {
    match shape {
        Shape::Null => Ok(Value::null(Type::Dynamic)),
        Shape::Bool(b) => Ok(Value::from(b)),
        Shape::Number(literal) => number(literal, path),
        Shape::String(s) => Ok(Value::from(s)),
        Shape::Sequence(items) => {
            let elems = elements(items, &Type::Dynamic, path, depth)?;
            Ok(Value::tuple(elems))
        }
        Shape::Mapping(entries) => {
            let mut fields: BTreeMap<Rc<str>, Value> = BTreeMap::new();
            for (key, item) in entries {
                let key = string_key(key, path)?;
                let v = unmarshal_at(item, &Type::Dynamic, &format!("{path}.{key}"), depth + 1)?;
                fields.insert(Rc::from(key), v);
            }
            Ok(Value::Object(Rc::new(fields)))
        }
    }
}

fn elements<D: GenericData>(items: &[D], want: &Type, path: &str, depth: usize) -> Result<Vec<Value>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| unmarshal_at(item, want, &format!("{path}[{idx}]"), depth + 1))
        .collect()
}

fn number(literal: String, path: &str) -> Result<Value> {
    match literal.parse::<Number>() {
        Ok(n) => Ok(Value::Number(n)),
        Err(_) => Err(UnmarshalError::UnrepresentableNumber {
            path: path.to_string(),
            literal,
        }),
    }
}

fn string_key<'a>(key: MapKey<'a>, path: &str) -> Result<&'a str> {
    match key {
        MapKey::String(s) => Ok(s),
        MapKey::Other(key_type) => Err(UnmarshalError::NonStringKey {
            path: path.to_string(),
            key_type: key_type.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dynamic_data_infers_objects_and_tuples() {
        let v = unmarshal(&json!({"a": true, "b": [1, "x"]}), &Type::Dynamic).unwrap();
        assert_eq!(
            v.ty(),
            Type::object([
                ("a", Type::Bool),
                ("b", Type::tuple(vec![Type::Number, Type::String])),
            ])
        );
    }

    #[test]
    fn sets_collapse_duplicates() {
        let v = unmarshal(&json!([1, 2, 2, 3]), &Type::set(Type::Number)).unwrap();
        assert_eq!(v, Value::set(Type::Number, [3, 1, 2].map(Value::from)));
        assert_eq!(v.len(), Some(3));
    }

    #[test]
    fn objects_need_exact_keys() {
        let ty = Type::object([("a", Type::String), ("b", Type::Number)]);
        let err = unmarshal(&json!({"a": "x"}), &ty).unwrap_err();
        assert_eq!(
            err,
            UnmarshalError::MissingAttribute {
                path: "$".to_string(),
                name: "b".to_string()
            }
        );
        let err = unmarshal(&json!({"a": "x", "b": 1, "c": 2}), &ty).unwrap_err();
        assert!(matches!(err, UnmarshalError::UnexpectedAttribute { .. }));
    }

    #[test]
    fn errors_carry_paths() {
        let ty = Type::object([("a", Type::object([("b", Type::list(Type::Number))]))]);
        let err = unmarshal(&json!({"a": {"b": [1, 2, "x"]}}), &ty).unwrap_err();
        assert_eq!(err.path(), "$.a.b[2]");
        assert_eq!(err.to_string(), "$.a.b[2]: number required, but got string");
    }

    #[test]
    fn numbers_are_exact() {
        let v = unmarshal(&json!(0.1), &Type::Number).unwrap();
        assert_eq!(v.as_number().unwrap(), &"0.1".parse::<Number>().unwrap());

        let big: serde_json::Value = serde_json::from_str("123456789012345678901234567890.5").unwrap();
        let v = unmarshal(&big, &Type::Number).unwrap();
        assert_eq!(v.to_string(), "123456789012345678901234567890.5");
    }

    #[test]
    fn null_takes_the_wanted_type() {
        let ty = Type::list(Type::String);
        assert_eq!(unmarshal(&json!(null), &ty).unwrap(), Value::null(ty));
    }

    #[test]
    fn tuples_need_their_arity() {
        let ty = Type::tuple(vec![Type::Number, Type::String]);
        let err = unmarshal(&json!([1]), &ty).unwrap_err();
        assert!(matches!(
            err,
            UnmarshalError::TupleLength {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_keys_must_be_strings() {
        let data: serde_yaml::Value = serde_yaml::from_str("{1: a}").unwrap();
        let err = unmarshal_yaml(&data, &Type::map(Type::String)).unwrap_err();
        assert!(matches!(err, UnmarshalError::NonStringKey { .. }));

        let data: serde_yaml::Value = serde_yaml::from_str(".inf").unwrap();
        let err = unmarshal_yaml(&data, &Type::Number).unwrap_err();
        assert!(matches!(err, UnmarshalError::UnrepresentableNumber { .. }));
    }

    #[test]
    fn deep_data_is_cut_off() {
        let mut data = json!(1);
        for _ in 0..(MAX_SCHEMA_DEPTH + 2) {
            data = json!([data]);
        }
        let err = unmarshal(&data, &Type::Dynamic).unwrap_err();
        assert!(matches!(err, UnmarshalError::DepthExceeded { .. }));
    }
}
