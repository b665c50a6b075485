// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tfstate::state::*;
use tfstate::*;

use anyhow::Result;
use serde_json::json;

const PROVIDER: &str = "registry.terraform.io/magodo/demo";

fn provider_schemas() -> Result<ProviderSchemas> {
    let schemas = json!({
        "format_version": "1.0",
        "provider_schemas": {
            "registry.terraform.io/magodo/demo": {
                "resource_schemas": {
                    "demo_resource_foo": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "attr_str": { "type": "string", "optional": true },
                                "attr_int": { "type": "number", "optional": true },
                                "attr_uint": { "type": "number", "optional": true },
                                "attr_float": { "type": "number", "optional": true },
                                "attr_number": { "type": "number", "optional": true },
                                "attr_bool": { "type": "bool", "optional": true },
                                "attr_list": { "type": ["list", "number"], "optional": true },
                                "attr_set": { "type": ["set", "number"], "optional": true },
                                "attr_map": { "type": ["map", "string"], "optional": true },
                                "attr_tuple": {
                                    "type": ["tuple", ["number", ["map", "string"], ["list", "number"]]],
                                    "optional": true
                                },
                                "object": {
                                    "type": ["object", {
                                        "field": "number",
                                        "nest": ["object", { "field": "string" }]
                                    }],
                                    "optional": true
                                }
                            }
                        }
                    },
                    "demo_resource_bar": {
                        "version": 1,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true }
                            },
                            "block_types": {
                                "rule": {
                                    "nesting_mode": "list",
                                    "block": {
                                        "attributes": {
                                            "port": { "type": "number", "required": true }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "data_source_schemas": {
                    "demo_data_foo": {
                        "version": 0,
                        "block": {
                            "attributes": {
                                "id": { "type": "string", "computed": true },
                                "extra": { "type": "dynamic", "computed": true }
                            }
                        }
                    }
                }
            }
        }
    });
    Ok(ProviderSchemas::from_json(&schemas.to_string())?)
}

fn foo_values() -> serde_json::Value {
    json!({
        "attr_str": "some string",
        "attr_int": -1,
        "attr_uint": 1,
        "attr_float": 0.1,
        "attr_number": 0.5,
        "attr_bool": true,
        "attr_list": [1, 2, 3],
        "attr_set": [1, 2, 3],
        "attr_map": { "key": "value" },
        "attr_tuple": [1, { "foo": "bar" }, [1, 2, 3]],
        "object": { "field": 1, "nest": { "field": "a" } }
    })
}

fn state_json(resources: serde_json::Value, outputs: serde_json::Value) -> String {
    json!({
        "format_version": "1.0",
        "terraform_version": "1.5.7",
        "values": {
            "outputs": outputs,
            "root_module": {
                "resources": resources
            }
        }
    })
    .to_string()
}

#[test]
fn resource_values() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let raw = state_json(
        json!([{
            "address": "demo_resource_foo.test",
            "mode": "managed",
            "type": "demo_resource_foo",
            "name": "test",
            "index": 1,
            "provider_name": PROVIDER,
            "schema_version": 0,
            "values": foo_values(),
            "sensitive_values": { "attr_str": true },
            "depends_on": ["dep"],
            "tainted": true,
            "deposed_key": "key"
        }]),
        json!({}),
    );
    let state = State::from_json(&raw, &provider_schemas()?)?;
    assert_eq!(state.format_version, "1.0");
    assert_eq!(state.terraform_version.as_deref(), Some("1.5.7"));

    let resources = state.resources();
    assert_eq!(resources.len(), 1);
    let r = resources[0];
    assert_eq!(r.address, "demo_resource_foo.test");
    assert_eq!(r.mode, ResourceMode::Managed);
    assert_eq!(r.resource_type, "demo_resource_foo");
    assert_eq!(r.name, "test");
    assert_eq!(r.index, Some(Value::from(1)));
    assert_eq!(r.provider_name, PROVIDER);
    assert_eq!(r.sensitive_values, Some(json!({ "attr_str": true })));
    assert_eq!(r.depends_on, ["dep"]);
    assert!(r.tainted);
    assert_eq!(r.deposed_key.as_deref(), Some("key"));

    let v = &r.value;
    assert_eq!(v["attr_str"], Value::from("some string"));
    assert_eq!(v["attr_int"].as_number()?.as_i64(), Some(-1));
    assert_eq!(v["attr_uint"].as_number()?.as_u64(), Some(1));
    assert_eq!(v["attr_float"].to_string(), "0.1");
    assert_eq!(v["attr_number"].to_string(), "0.5");
    assert_eq!(v["attr_bool"], Value::from(true));
    assert_eq!(
        v["attr_list"],
        Value::list(Type::Number, [1, 2, 3].map(Value::from).to_vec())
    );
    assert_eq!(v["attr_set"], Value::set(Type::Number, [1, 2, 3].map(Value::from)));
    assert_eq!(
        v["attr_map"],
        Value::map(Type::String, [("key", Value::from("value"))])
    );
    assert_eq!(v["attr_tuple"][0], Value::from(1));
    assert_eq!(
        v["attr_tuple"][1],
        Value::map(Type::String, [("foo", Value::from("bar"))])
    );
    assert_eq!(v["attr_tuple"][2].len(), Some(3));
    assert_eq!(v["object"]["field"], Value::from(1));
    assert_eq!(v["object"]["nest"]["field"], Value::from("a"));

    let schemas = provider_schemas()?;
    let block = &schemas.schemas[PROVIDER].resource_schemas["demo_resource_foo"].block;
    assert_eq!(v.ty(), block.implied_type());
    Ok(())
}

#[test]
fn modules_outputs_and_data_sources() -> Result<()> {
    let raw = json!({
        "format_version": "1.0",
        "values": {
            "outputs": {
                "typed": { "sensitive": false, "value": ["a", "b"], "type": ["list", "string"] },
                "untyped": { "sensitive": true, "value": { "n": 1 } }
            },
            "root_module": {
                "resources": [{
                    "address": "data.demo_data_foo.test",
                    "mode": "data",
                    "type": "demo_data_foo",
                    "name": "test",
                    "provider_name": PROVIDER,
                    "values": { "id": "x", "extra": { "any": [true] } }
                }],
                "child_modules": [{
                    "address": "module.child",
                    "resources": [{
                        "address": "module.child.demo_resource_bar.test[\"k\"]",
                        "mode": "managed",
                        "type": "demo_resource_bar",
                        "name": "test",
                        "index": "k",
                        "provider_name": PROVIDER,
                        "schema_version": 1,
                        "values": { "id": "bar", "rule": [{ "port": 80 }] }
                    }]
                }]
            }
        }
    })
    .to_string();
    let state = State::from_json(&raw, &provider_schemas()?)?;

    let values = state.values.as_ref().unwrap();
    let typed = &values.outputs["typed"];
    assert!(!typed.sensitive);
    assert_eq!(typed.value.ty(), Type::list(Type::String));
    let untyped = &values.outputs["untyped"];
    assert!(untyped.sensitive);
    assert_eq!(untyped.value.ty(), Type::object([("n", Type::Number)]));

    let resources = state.resources();
    let addresses: Vec<&str> = resources.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(
        addresses,
        ["data.demo_data_foo.test", "module.child.demo_resource_bar.test[\"k\"]"]
    );

    let data = resources[0];
    assert_eq!(data.mode, ResourceMode::Data);
    assert_eq!(
        data.value["extra"].ty(),
        Type::object([("any", Type::tuple(vec![Type::Bool]))])
    );

    let bar = resources[1];
    assert_eq!(bar.index, Some(Value::from("k")));
    assert_eq!(bar.schema_version, 1);
    assert_eq!(bar.value["rule"][0]["port"], Value::from(80));
    Ok(())
}

#[test]
fn empty_states() -> Result<()> {
    let schemas = provider_schemas()?;

    let state = State::from_json(r#"{ "format_version": "1.0" }"#, &schemas)?;
    assert!(state.values.is_none());
    assert!(state.resources().is_empty());

    let state = State::from_json(r#"{ "format_version": "0.2", "values": {} }"#, &schemas)?;
    let values = state.values.as_ref().unwrap();
    assert!(values.root_module.is_none());
    assert!(values.outputs.is_empty());

    let state = State::from_json(
        r#"{ "format_version": "1.0", "values": { "root_module": {}, "outputs": {} } }"#,
        &schemas,
    )?;
    assert_eq!(
        state.values.unwrap().root_module,
        Some(StateModule::default())
    );
    Ok(())
}

#[test]
fn errors() -> Result<()> {
    let schemas = provider_schemas()?;
    let resource = |provider: &str, resource_type: &str, values: serde_json::Value| {
        state_json(
            json!([{
                "address": format!("{resource_type}.test"),
                "type": resource_type,
                "name": "test",
                "provider_name": provider,
                "values": values
            }]),
            json!({}),
        )
    };

    let err = State::from_json(r#"{ "format_version": "2.0" }"#, &schemas).unwrap_err();
    assert!(matches!(err, StateError::UnsupportedFormatVersion(_)));

    let raw = resource("registry.terraform.io/other/p", "demo_resource_foo", json!({}));
    let err = State::from_json(&raw, &schemas).unwrap_err();
    assert!(matches!(err, StateError::UnknownProvider { .. }));

    let raw = resource(PROVIDER, "demo_resource_baz", json!({}));
    let err = State::from_json(&raw, &schemas).unwrap_err();
    assert!(matches!(err, StateError::UnknownResourceType { kind: "resource", .. }));

    let raw = resource(PROVIDER, "demo_resource_bar", json!({ "id": 1, "rule": [] }));
    let err = State::from_json(&raw, &schemas).unwrap_err();
    match err {
        StateError::Unmarshal { address, source } => {
            assert_eq!(address, "demo_resource_bar.test");
            assert_eq!(source.path(), "$.id");
        }
        other => panic!("unexpected error {other}"),
    }

    let err = State::from_json("not json", &schemas).unwrap_err();
    assert!(matches!(err, StateError::Json(_)));
    Ok(())
}
