// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tfstate::*;

use anyhow::{bail, Result};
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Deserialize, Debug)]
struct TestCase {
    note: String,
    #[serde(rename = "type")]
    ty: Type,
    data: serde_yaml::Value,
    want: Option<serde_json::Value>,
    want_type: Option<Type>,
    want_error: Option<String>,
    // JSON turns non-string keys into strings, so such data is only
    // checked as YAML.
    yaml_only: Option<bool>,
    skip: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn check_value(case: &TestCase, v: &Value) -> Result<()> {
    if let Some(want) = &case.want {
        let got = serde_json::to_value(v)?;
        if &got != want {
            bail!("value mismatch\nleft  = {got}\nright = {want}");
        }
    }
    if let Some(want_type) = &case.want_type {
        if &v.ty() != want_type {
            bail!("type mismatch\nleft  = {}\nright = {want_type}", v.ty());
        }
    }
    if !v.conforms_to(&case.ty) {
        bail!("{v} does not conform to {}", case.ty);
    }

    check_round_trip(v, &case.ty)
}

// Unmarshalling the generic form again against the target type gives back
// the same value, through JSON and YAML alike.
fn check_round_trip(v: &Value, ty: &Type) -> Result<()> {
    let json = serde_json::to_value(v)?;
    let again = unmarshal(&json, ty)?;
    if &again != v {
        bail!("unmarshalling {json} again gave {again}, not {v}");
    }

    let yaml = serde_yaml::to_value(v)?;
    let again = unmarshal_yaml(&yaml, ty)?;
    if &again != v {
        bail!("unmarshalling {yaml:?} again gave {again}, not {v}");
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    std::eprintln!("running {file}");

    for case in &test.cases {
        std::print!("case {} ", case.note);
        if case.skip == Some(true) {
            std::println!("skipped");
            continue;
        }

        let result = unmarshal_yaml(&case.data, &case.ty);

        // The same data as JSON must agree.
        if case.yaml_only != Some(true) {
            let json = serde_json::to_value(&case.data)?;
            let json_result = unmarshal(&json, &case.ty);
            if json_result != result {
                bail!("JSON and YAML disagree: {json_result:?} != {result:?}");
            }
        }

        match (&case.want_error, result) {
            (None, Ok(v)) => check_value(case, &v)?,
            (Some(expected), Err(actual)) => {
                if !actual.to_string().contains(expected) {
                    bail!("`{actual}` does not contain `{expected}`");
                }
            }
            (None, Err(e)) => bail!("unmarshal failed unexpectedly: {e}"),
            (Some(expected), Ok(v)) => bail!("expected error `{expected}`, got {v}"),
        }

        std::eprintln!("passed");
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{file}: {e}");
        }
    }
}

#[test_resources("tests/unmarshal/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}

#[test]
fn resource_values() -> Result<()> {
    let schema = BlockSchema::from_json_str(
        r#"{
            "attributes": {
                "attr_str": { "type": "string", "optional": true },
                "attr_number": { "type": "number", "optional": true },
                "attr_dynamic": { "type": "dynamic", "optional": true },
                "attr_null": { "type": ["list", "string"], "optional": true },
                "attr_set": { "type": ["set", "number"], "optional": true },
                "attr_tuple": {
                    "type": ["tuple", ["number", ["map", "string"], ["list", "number"]]],
                    "optional": true
                }
            },
            "block_types": {
                "rule": {
                    "nesting_mode": "list",
                    "block": { "attributes": { "port": { "type": "number", "required": true } } }
                }
            }
        }"#,
    )?;
    let data: serde_json::Value = serde_json::from_str(
        r#"{
            "attr_str": "some string",
            "attr_number": 0.5,
            "attr_dynamic": { "a": [1, "x", null], "b": 2.25 },
            "attr_null": null,
            "attr_set": [3, 1, 2, 1],
            "attr_tuple": [1, { "foo": "bar" }, [1, 2, 3]],
            "rule": [{ "port": 80 }, { "port": 443 }]
        }"#,
    )?;

    let v = unmarshal(&data, &schema.implied_type())?;
    assert!(v.conforms_to(&schema.implied_type()));
    assert_eq!(v["attr_str"].as_string()?.as_ref(), "some string");
    assert_eq!(v["attr_number"].to_string(), "0.5");
    assert_eq!(v["attr_set"].len(), Some(3));
    assert_eq!(v["attr_tuple"][1]["foo"], Value::from("bar"));
    assert_eq!(v["rule"][1]["port"], Value::from(443));
    assert_eq!(v["attr_dynamic"]["a"][1], Value::from("x"));
    assert_eq!(v["attr_dynamic"]["a"][2], Value::null(Type::Dynamic));
    assert_eq!(v["attr_null"], Value::null(Type::list(Type::String)));
    assert!(v["missing"].is_no_value());

    check_round_trip(&v, &schema.implied_type())?;
    let yaml = serde_yaml::to_string(&v)?;
    assert!(yaml.contains("attr_number: 0.5"), "{yaml}");
    assert!(yaml.contains("b: 2.25"), "{yaml}");
    Ok(())
}
