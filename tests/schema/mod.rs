// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tfstate::decode::{decode, BodyContent};
use tfstate::*;

use anyhow::{bail, Result};
use serde::Deserialize;
use test_generator::test_resources;

#[derive(Deserialize, Debug)]
struct TestCase {
    note: String,
    schema: BlockSchema,
    want_type: Type,
    want_spec_type: Option<Type>,
    want_empty: Option<serde_json::Value>,
    skip: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase) -> Result<()> {
    let implied = case.schema.implied_type();
    if implied != case.want_type {
        bail!("implied type mismatch\nleft  = {implied}\nright = {}", case.want_type);
    }

    let spec_type = case.schema.spec_type();
    if let Some(want) = &case.want_spec_type {
        if &spec_type != want {
            bail!("spec type mismatch\nleft  = {spec_type}\nright = {want}");
        }
    }
    if spec_type.without_optional_attrs() != implied {
        bail!("spec type {spec_type} does not reduce to {implied}");
    }

    let empty = case.schema.empty_value();
    if let Some(want) = &case.want_empty {
        let got = serde_json::to_value(&empty)?;
        if &got != want {
            bail!("empty value mismatch\nleft  = {got}\nright = {want}");
        }
    }
    if !empty.conforms_to(&implied) {
        bail!("empty value {empty} does not conform to {implied}");
    }

    let spec = case.schema.decoder_spec();
    let (decoded, diags) = decode(&BodyContent::new(), &spec);
    if !decoded.conforms_to(&implied) {
        bail!("decoded value {decoded} does not conform to {implied}");
    }
    if !implied.has_dynamic_types() && decoded.ty() != implied {
        bail!("decoded value has type {}, not {implied}", decoded.ty());
    }
    // Only required attributes can be missing from an empty body.
    for d in &diags {
        if d.summary != "Missing required argument" {
            bail!("unexpected diagnostic: {d}");
        }
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
        run_case(case).map_err(|e| anyhow::anyhow!("case `{}`: {e}", case.note))?;
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

#[test_resources("tests/schema/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
