//! reservoir-opt - command-line front end for the reservoir models and lift optimizers
//!
//! # Usage
//!
//! ```bash
//! # Hyperbolic rate after 12 months
//! reservoir-opt decline --qi 1000 --di 0.1 --b 0.5 --decline-type hyperbolic --value 12
//!
//! # Vogel rate at 1500 psi
//! reservoir-opt ipr --pr 3000 --pwf 1500 --method vogel --qmax 1200
//!
//! # Optimize a stored ESP well
//! reservoir-opt optimize esp --store wells.json --asset well-7
//!
//! # Distribute gas across a field
//! reservoir-opt gas-lift --store wells.json --field north --total-gas 4000
//! ```
//!
//! # Environment Variables
//!
//! - `RESERVOIR_OPT_CONFIG`: Path to the optimizer config TOML
//! - `RUST_LOG`: Logging level (default: info)
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use reservoir_optimizer::optimization::{self, create_recommendation, gas_lift};
use reservoir_optimizer::physics_engine::pvt;
use reservoir_optimizer::physics_engine::{
    DeclineCalculation, DeclineParameters, DeclineType, IprEquation, IprMethod, IprModel,
    MaterialBalanceStudy, PvtCorrelation, PvtInputs, PvtProperty,
};
use reservoir_optimizer::{EngineConfig, InMemoryStore, LiftType};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "reservoir-opt")]
#[command(about = "Reservoir engineering models and artificial-lift optimization")]
#[command(version)]
struct CliArgs {
    /// Optimizer config TOML (default: $RESERVOIR_OPT_CONFIG, then ./optimizer_config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Evaluate an Arps decline curve
    Decline {
        #[arg(long)]
        qi: f64,
        #[arg(long)]
        di: f64,
        /// Hyperbolic exponent; falls back to the configured default
        #[arg(long)]
        b: Option<f64>,
        #[arg(long, default_value = "exponential", value_parser = parse_enum::<DeclineType>)]
        decline_type: DeclineType,
        #[arg(long, default_value = "rate-at-time", value_parser = parse_enum::<DeclineCalculation>)]
        calculation: DeclineCalculation,
        /// Time, or the target / economic-limit rate for time-to-rate and eur
        #[arg(long)]
        value: f64,
        /// Also tabulate rate and cumulative up to this time
        #[arg(long)]
        forecast: Option<f64>,
        #[arg(long, default_value = "1")]
        step: f64,
    },

    /// Inflow performance: evaluate an equation or fit one well test
    Ipr {
        #[arg(long)]
        pr: f64,
        #[arg(long)]
        pwf: f64,
        #[arg(long, default_value = "vogel", value_parser = parse_enum::<IprMethod>)]
        method: IprMethod,
        #[arg(long)]
        qmax: Option<f64>,
        /// Productivity index (bpd/psi)
        #[arg(long)]
        j: Option<f64>,
        #[arg(long)]
        c: Option<f64>,
        #[arg(long)]
        n: Option<f64>,
        #[arg(long)]
        a: Option<f64>,
        #[arg(long = "b-coeff")]
        b: Option<f64>,
        /// Fit from a test rate at --pwf instead of evaluating
        #[arg(long)]
        test_rate: Option<f64>,
        /// Bubble point for a composite fit
        #[arg(long)]
        pb: Option<f64>,
        #[arg(long, default_value = "10")]
        curve_points: usize,
    },

    /// Evaluate a PVT correlation
    Pvt {
        #[arg(long, value_parser = parse_enum::<PvtProperty>)]
        property: PvtProperty,
        #[arg(long, value_parser = parse_enum::<PvtCorrelation>)]
        correlation: PvtCorrelation,
        #[arg(long)]
        rs: Option<f64>,
        #[arg(long)]
        gas_gravity: Option<f64>,
        #[arg(long)]
        oil_gravity: Option<f64>,
        #[arg(long)]
        api_gravity: Option<f64>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        pressure: Option<f64>,
    },

    /// Run a Havlena-Odeh analysis on a study JSON file
    Mbe {
        study: PathBuf,
    },

    /// Optimize one well from a store JSON file
    Optimize {
        #[arg(value_parser = parse_enum::<LiftType>)]
        lift: LiftType,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        asset: String,
    },

    /// Allocate lift gas across a field's gas-lift wells
    GasLift {
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        field: String,
        /// Gas budget (MSCF/day); defaults to the configured field maximum
        #[arg(long)]
        total_gas: Option<f64>,
    },

    /// Validate a config file and print the effective values
    CheckConfig {
        path: PathBuf,
    },
}

/// Parse a kebab- or snake-case CLI value into a SCREAMING_SNAKE_CASE serde enum.
fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let name = raw.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(json!(name)).map_err(|_| format!("unknown value '{raw}'"))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.json);

    if let SubCommand::CheckConfig { path } = &args.command {
        return check_config(path);
    }

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::load(),
    };

    match args.command {
        SubCommand::Decline {
            qi,
            di,
            b,
            decline_type,
            calculation,
            value,
            forecast,
            step,
        } => {
            let params = DeclineParameters::for_type(
                decline_type,
                qi,
                di,
                b,
                config.decline.default_b_exponent,
            )?;
            let result = params.evaluate(calculation, value)?;
            let forecast = forecast.map(|h| params.forecast(h, step)).transpose()?;
            print_json(&json!({
                "parameters": params,
                "declineType": params.decline_type(),
                "calculation": calculation,
                "result": result,
                "forecast": forecast,
            }))
        }

        SubCommand::Ipr {
            pr,
            pwf,
            method,
            qmax,
            j,
            c,
            n,
            a,
            b,
            test_rate,
            pb,
            curve_points,
        } => {
            if let Some(rate) = test_rate {
                let model = IprModel::fit_from_test(method, pr, pb, rate, pwf)?;
                let curve = model.generate_curve(curve_points)?;
                return print_json(&json!({ "model": model, "curve": curve }));
            }
            let missing = |name: &str| anyhow::anyhow!("--{name} is required for the {method} method");
            let equation = match method {
                IprMethod::Vogel => IprEquation::Vogel {
                    qmax: qmax.ok_or_else(|| missing("qmax"))?,
                },
                IprMethod::Darcy => IprEquation::Darcy {
                    productivity_index: j.ok_or_else(|| missing("j"))?,
                },
                IprMethod::Fetkovich => IprEquation::Fetkovich {
                    c: c.ok_or_else(|| missing("c"))?,
                    n: n.unwrap_or(1.0),
                },
                IprMethod::Jones => IprEquation::Jones {
                    a: a.ok_or_else(|| missing("a"))?,
                    b: b.ok_or_else(|| missing("b-coeff"))?,
                },
            };
            let rate = equation.flow_rate(pr, pwf)?;
            print_json(&json!({ "equation": equation, "pr": pr, "pwf": pwf, "rate": rate }))
        }

        SubCommand::Pvt {
            property,
            correlation,
            rs,
            gas_gravity,
            oil_gravity,
            api_gravity,
            temperature,
            pressure,
        } => {
            let inputs = PvtInputs {
                rs,
                gas_gravity,
                oil_gravity,
                api_gravity,
                temperature,
                pressure,
            };
            let value = pvt::calculate(property, correlation, &inputs)?;
            print_json(&json!({
                "property": property,
                "correlation": correlation,
                "value": value,
            }))
        }

        SubCommand::Mbe { study } => {
            let mut study: MaterialBalanceStudy = read_json(&study)?;
            study.havlena_odeh_analysis()?;
            print_json(&study)
        }

        SubCommand::Optimize { lift, store, asset } => {
            let store = load_store(&store)?;
            let Some(result) = optimization::optimize(lift, &store, &asset, &config) else {
                anyhow::bail!("No {lift} optimization for '{asset}' (see log for the reason)");
            };
            let recommendation = create_recommendation(&result, &config, Utc::now());
            print_json(&json!({ "result": result, "recommendation": recommendation }))
        }

        SubCommand::GasLift {
            store,
            field,
            total_gas,
        } => {
            let store = load_store(&store)?;
            let Some(result) = gas_lift::allocate(&store, &field, total_gas, &config) else {
                anyhow::bail!("No gas-lift allocation for field '{field}' (see log for the reason)");
            };
            let recommendations = gas_lift::create_recommendations(&result, &config, Utc::now());
            print_json(&json!({ "result": result, "recommendations": recommendations }))
        }

        SubCommand::CheckConfig { .. } => Ok(()),
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn check_config(path: &Path) -> Result<()> {
    let config = EngineConfig::load_from_file(path)
        .with_context(|| format!("Config {} is invalid", path.display()))?;
    info!(path = %path.display(), "Config is valid");
    print_json(&config)
}

fn load_store(path: &Path) -> Result<InMemoryStore> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    InMemoryStore::from_json(&contents)
        .with_context(|| format!("Invalid store file {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
