// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::pattern_type_mismatch)]

//! Conversion of decoded values to the types a spec wants.
//!
//! Conversions only go from more specific to less specific representations,
//! plus the string forms of numbers and bools. Object attributes marked
//! optional in the wanted type may be missing from the input; they become
//! null.

use std::collections::BTreeMap;

use crate::number::Number;
use crate::types::{ConformanceError, Type};
use crate::value::Value;
use crate::Rc;

type Result<T> = core::result::Result<T, ConformanceError>;

/// Converts `value` to `want`, producing a value of the storage form of
/// `want`.
pub fn convert(value: &Value, want: &Type) -> Result<Value> {
    convert_at(value, want, "")
}

fn fail<T>(path: &str, message: impl Into<String>) -> Result<T> {
    Err(ConformanceError {
        path: path.to_string(),
        message: message.into(),
    })
}

fn convert_at(value: &Value, want: &Type, path: &str) -> Result<Value> {
    match (value, want) {
        (Value::NoValue, _) => fail(path, "a value is required"),
        (_, Type::Dynamic) => Ok(value.clone()),
        (Value::Null(_), _) => Ok(Value::null(want.without_optional_attrs())),
        (Value::Unknown(_), _) => Ok(Value::unknown(want.without_optional_attrs())),

        (Value::Bool(_), Type::Bool)
        | (Value::Number(_), Type::Number)
        | (Value::String(_), Type::String) => Ok(value.clone()),

        (Value::Number(n), Type::String) => Ok(Value::from(n.format_decimal())),
        (Value::Bool(b), Type::String) => Ok(Value::from(if *b { "true" } else { "false" })),
        (Value::String(s), Type::Number) => match s.parse::<Number>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) => fail(path, "a number is required"),
        },
        (Value::String(s), Type::Bool) => match s.as_ref() {
            "true" => Ok(Value::from(true)),
            "false" => Ok(Value::from(false)),
            _ => fail(path, "a bool is required"),
        },

        (Value::List(_, elems) | Value::Tuple(elems), Type::List(e)) => {
            let elems = convert_elements(elems.iter(), e, path)?;
            Ok(Value::list(e.without_optional_attrs(), elems))
        }
        (Value::Set(_, elems), Type::List(e)) => {
            let elems = convert_elements(elems.iter(), e, path)?;
            Ok(Value::list(e.without_optional_attrs(), elems))
        }
        (Value::List(_, elems) | Value::Tuple(elems), Type::Set(e)) => {
            let elems = convert_elements(elems.iter(), e, path)?;
            Ok(Value::set(e.without_optional_attrs(), elems))
        }
        (Value::Set(_, elems), Type::Set(e)) => {
            let elems = convert_elements(elems.iter(), e, path)?;
            Ok(Value::set(e.without_optional_attrs(), elems))
        }
        (Value::Map(_, attrs) | Value::Object(attrs), Type::Map(e)) => {
            let mut entries = BTreeMap::new();
            for (k, v) in attrs.iter() {
                entries.insert(k.clone(), convert_at(v, e, &format!("{path}[\"{k}\"]"))?);
            }
            Ok(Value::Map(e.without_optional_attrs(), Rc::new(entries)))
        }
        (Value::List(_, elems) | Value::Tuple(elems), Type::Tuple(types)) => {
            if elems.len() != types.len() {
                return fail(
                    path,
                    format!("tuple required with {} elements, not {}", types.len(), elems.len()),
                );
            }
            let elems = elems
                .iter()
                .zip(types.iter())
                .enumerate()
                .map(|(idx, (v, t))| convert_at(v, t, &format!("{path}[{idx}]")))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::tuple(elems))
        }
        (Value::Map(_, attrs) | Value::Object(attrs), Type::Object(o)) => {
            if let Some(name) = attrs.keys().find(|k| o.attribute(k).is_none()) {
                return fail(path, format!("unsupported attribute \"{name}\""));
            }
            let mut converted = BTreeMap::new();
            for (name, t) in o.attributes() {
                let v = match attrs.get(name.as_str()) {
                    Some(v) => convert_at(v, t, &format!("{path}.{name}"))?,
                    None if o.is_optional(name) => Value::null(t.without_optional_attrs()),
                    None => return fail(path, format!("attribute \"{name}\" is required")),
                };
                converted.insert(Rc::from(name.as_str()), v);
            }
            Ok(Value::Object(Rc::new(converted)))
        }

        (_, _) => fail(
            path,
            format!("{} required, but got {}", want.friendly_name(), value.ty().friendly_name()),
        ),
    }
}

fn convert_elements<'a>(
    elems: impl Iterator<Item = &'a Value>,
    want: &Type,
    path: &str,
) -> Result<Vec<Value>> {
    elems
        .enumerate()
        .map(|(idx, v)| convert_at(v, want, &format!("{path}[{idx}]")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(convert(&Value::from(5), &Type::String).unwrap(), Value::from("5"));
        assert_eq!(convert(&Value::from(true), &Type::String).unwrap(), Value::from("true"));
        assert_eq!(convert(&Value::from("1.5"), &Type::Number).unwrap().to_string(), "1.5");
        assert_eq!(convert(&Value::from("false"), &Type::Bool).unwrap(), Value::from(false));

        let err = convert(&Value::from(true), &Type::Number).unwrap_err();
        assert_eq!(err.to_string(), "number required, but got bool");
        assert!(convert(&Value::from("x"), &Type::Number).is_err());
    }

    #[test]
    fn nulls_and_unknowns_take_the_wanted_type() {
        let want = Type::object_with_optional([("a", Type::String)], ["a"]);
        assert_eq!(
            convert(&Value::null(Type::Dynamic), &want).unwrap(),
            Value::null(Type::object([("a", Type::String)]))
        );
        assert_eq!(
            convert(&Value::unknown(Type::String), &Type::String).unwrap(),
            Value::unknown(Type::String)
        );
    }

    #[test]
    fn collections() {
        let tuple = Value::tuple(vec![Value::from(1), Value::from(2), Value::from(1)]);
        assert_eq!(
            convert(&tuple, &Type::list(Type::String)).unwrap(),
            Value::list(Type::String, vec!["1".into(), "2".into(), "1".into()])
        );
        assert_eq!(
            convert(&tuple, &Type::set(Type::Number)).unwrap().len(),
            Some(2)
        );

        let object = Value::object([("x", Value::from(1))]);
        assert_eq!(
            convert(&object, &Type::map(Type::Number)).unwrap(),
            Value::map(Type::Number, [("x", Value::from(1))])
        );
    }

    #[test]
    fn optional_attributes_are_filled() {
        let want = Type::object_with_optional([("foo", Type::String), ("bar", Type::String)], ["bar"]);
        let got = convert(&Value::object([("foo", Value::from("x"))]), &want).unwrap();
        assert_eq!(
            got,
            Value::object([("bar", Value::null(Type::String)), ("foo", Value::from("x"))])
        );

        let err = convert(&Value::empty_object(), &want).unwrap_err();
        assert_eq!(err.to_string(), "attribute \"foo\" is required");

        let extra = Value::object([("foo", Value::from("x")), ("baz", Value::from(1))]);
        assert!(convert(&extra, &want).is_err());
    }

    #[test]
    fn errors_name_the_path() {
        let want = Type::list(Type::object([("foo", Type::String)]));
        let input = Value::list(
            Type::object([("foo", Type::list(Type::String))]),
            vec![Value::object([(
                "foo",
                Value::list(Type::String, vec!["a".into()]),
            )])],
        );
        let err = convert(&input, &want).unwrap_err();
        assert_eq!(err.path, "[0].foo");
    }
}
