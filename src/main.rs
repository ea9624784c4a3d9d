//! Financial calculator CLI
//!
//! Thin shell over the engine: list calculators, describe one, run one
//! calculation, or run a JSON batch file in parallel. Output is always the
//! dispatch envelope as pretty-printed JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Deserialize;

use fincalc::{dispatch, InputSet, InputValue, Registry};

#[derive(Parser)]
#[command(name = "fincalc", about = "Financial calculation engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every registered calculator
    List,
    /// Show a calculator's input fields
    Describe { id: String },
    /// Run one calculation
    Calc {
        id: String,
        /// Inputs as key=value pairs
        #[arg(short = 'i', long = "input", value_name = "KEY=VALUE")]
        inputs: Vec<String>,
        /// Inputs as a JSON object (merged over key=value pairs)
        #[arg(long)]
        json: Option<String>,
    },
    /// Run a JSON batch file of calculation requests
    Batch { file: PathBuf },
}

/// One request in a batch file.
#[derive(Deserialize)]
struct BatchRequest {
    calculator: String,
    #[serde(default)]
    inputs: InputSet,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let registry = Registry::with_defaults();

    match cli.command {
        Command::List => {
            for descriptor in registry.list() {
                println!("{:<20} {}", descriptor.slug, descriptor.label);
            }
        }
        Command::Describe { id } => {
            let calculator = registry
                .get(&id)
                .map_err(|err| anyhow::anyhow!("{err}"))?;
            let descriptor = calculator.descriptor();
            println!("{} ({})", descriptor.label, descriptor.slug);
            for field in &descriptor.fields {
                let marker = if field.required { "required" } else { "optional" };
                println!("  {:<28} {:<8} {}", field.name, marker, field.label);
            }
        }
        Command::Calc { id, inputs, json } => {
            let set = build_inputs(&inputs, json.as_deref())?;
            let envelope = dispatch(&registry, &id, &set);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Batch { file } => {
            let reader = BufReader::new(
                File::open(&file).with_context(|| format!("opening {}", file.display()))?,
            );
            let requests: Vec<BatchRequest> =
                serde_json::from_reader(reader).context("parsing batch file")?;

            let envelopes: Vec<serde_json::Value> = requests
                .par_iter()
                .map(|request| {
                    serde_json::json!({
                        "calculator": request.calculator,
                        "result": dispatch(&registry, &request.calculator, &request.inputs),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&envelopes)?);
        }
    }
    Ok(())
}

/// Merge key=value pairs and an optional JSON object into one input set.
fn build_inputs(pairs: &[String], json: Option<&str>) -> Result<InputSet> {
    let mut set = InputSet::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("input '{pair}' is not in key=value form");
        };
        let parsed = match value.parse::<f64>() {
            Ok(number) => InputValue::Number(number),
            Err(_) => InputValue::Text(value.to_string()),
        };
        set.insert(key.trim().to_string(), parsed);
    }
    if let Some(text) = json {
        let overlay: InputSet = serde_json::from_str(text).context("parsing --json inputs")?;
        set.extend(overlay);
    }
    Ok(set)
}
