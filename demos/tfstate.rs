// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tfstate::state::{ProviderSchemas, State};
use tfstate::{BlockSchema, Type};

fn read_file(file: &str) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))
}

fn state_show(schemas: String, state: String) -> Result<()> {
    let schemas = ProviderSchemas::from_json(&read_file(&schemas)?)?;
    let state = State::from_json(&read_file(&state)?, &schemas)?;

    for resource in state.resources() {
        println!("{} ({})", resource.address, resource.value.ty());
        println!("  {}", resource.value);
    }
    if let Some(values) = &state.values {
        for (name, output) in &values.outputs {
            if output.sensitive {
                println!("output.{name} = <sensitive>");
            } else {
                println!("output.{name} = {}", output.value);
            }
        }
    }
    Ok(())
}

fn schema_types(file: String, spec: bool) -> Result<()> {
    let block = BlockSchema::from_json_str(&read_file(&file)?)?;
    let ty = if spec {
        block.spec_type()
    } else {
        block.implied_type()
    };
    println!("{ty}");
    println!("{}", serde_json::to_string_pretty(&ty)?);
    Ok(())
}

fn data_unmarshal(data: String, ty: String) -> Result<()> {
    let ty: Type = serde_json::from_str(&ty).with_context(|| format!("Invalid type `{ty}`"))?;
    let contents = read_file(&data)?;
    let value = if data.ends_with(".json") {
        tfstate::unmarshal(&serde_json::from_str(&contents)?, &ty)?
    } else if data.ends_with(".yaml") {
        tfstate::unmarshal_yaml(&serde_yaml::from_str(&contents)?, &ty)?
    } else {
        bail!("Unsupported data file `{data}`. Must be json or yaml.")
    };
    println!("{}", value.ty());
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[derive(Subcommand)]
enum TfstateCommand {
    /// Print the typed resources and outputs of a state.
    Show {
        /// Provider schemas, as printed by `terraform providers schema -json`.
        #[arg(long, short, value_name = "schemas.json")]
        schemas: String,

        /// State, as printed by `terraform show -json`.
        #[arg(value_name = "state.json")]
        state: String,
    },

    /// Print the type implied by a block schema.
    Type {
        /// Block schema.
        #[arg(value_name = "block.json")]
        file: String,

        /// Mark omittable attributes optional.
        #[arg(long)]
        spec: bool,
    },

    /// Unmarshal data against a type.
    Unmarshal {
        /// Data file. json or yaml.
        #[arg(value_name = "data.json|data.yaml")]
        data: String,

        /// Type in JSON notation, e.g. '["list", "string"]'.
        #[arg(long = "type", short = 't', default_value = "\"dynamic\"")]
        type_expr: String,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: TfstateCommand,
}

fn main() -> Result<()> {
    env_logger::init();

    // Parse and dispatch command.
    let cli = Cli::parse();
    match cli.command {
        TfstateCommand::Show { schemas, state } => state_show(schemas, state),
        TfstateCommand::Type { file, spec } => schema_types(file, spec),
        TfstateCommand::Unmarshal { data, type_expr } => data_unmarshal(data, type_expr),
    }
}
