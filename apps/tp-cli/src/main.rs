use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tp_core::units::{k, kg_per_m3, mol_per_m3, pa};
use tp_fluids::factory::BACKEND_TOKENS;
use tp_fluids::{
    FluidBackend, FluidError, Parameter, Quantity, Solution, Species, StateInput, TableConfig,
    UnitError, construct_with_config, parse_quantity,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Fluid(#[from] FluidError),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error("Failed to read table config: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(about = "ThermoProp CLI - thermophysical state evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate properties at one state
    Props {
        #[command(flatten)]
        state: StateArgs,
        /// Comma-separated output keys (e.g. T,P,Hmolar)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
    },
    /// Evaluate a generic partial derivative
    Deriv {
        #[command(flatten)]
        state: StateArgs,
        /// Differentiated quantity
        #[arg(long)]
        of: String,
        /// Independent variable
        #[arg(long)]
        wrt: String,
        /// Quantity held constant
        #[arg(long)]
        constant: String,
        /// Second independent variable, for a second derivative
        #[arg(long, requires = "constant2")]
        wrt2: Option<String>,
        /// Quantity held constant in the second derivative
        #[arg(long, requires = "wrt2")]
        constant2: Option<String>,
    },
    /// List backend tokens and library fluids
    Backends,
}

#[derive(Args)]
struct StateArgs {
    /// Backend token, e.g. HEOS, TTSE&HEOS, INCOMP or ?
    #[arg(long, default_value = "?")]
    backend: String,
    /// Fluid string, e.g. Water, Nitrogen[0.79]&Oxygen[0.21], MEG-30%
    #[arg(long)]
    fluid: String,
    /// Temperature, e.g. "300 K" or "25 C"
    #[arg(long)]
    t: String,
    /// Pressure, e.g. "1 bar"
    #[arg(long, conflicts_with_all = ["rho", "rhomolar"])]
    p: Option<String>,
    /// Mass density, e.g. "996 kg/m3"
    #[arg(long, conflicts_with = "rhomolar")]
    rho: Option<String>,
    /// Molar density, e.g. "55 mol/L"
    #[arg(long)]
    rhomolar: Option<String>,
    /// Fractions in the backend's native basis
    #[arg(long, value_delimiter = ',')]
    fractions: Vec<f64>,
    /// YAML table configuration for TTSE/BICUBIC backends
    #[arg(long)]
    table_config: Option<PathBuf>,
    /// Print the result as YAML
    #[arg(long)]
    yaml: bool,
}

#[derive(Serialize)]
struct PropsReport {
    backend: String,
    fluid: String,
    phase: Option<String>,
    values: BTreeMap<String, f64>,
    unavailable: BTreeMap<String, String>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Props { state, keys } => cmd_props(&state, &keys),
        Commands::Deriv {
            state,
            of,
            wrt,
            constant,
            wrt2,
            constant2,
        } => cmd_deriv(&state, &of, &wrt, &constant, wrt2.zip(constant2)),
        Commands::Backends => {
            cmd_backends();
            Ok(())
        }
    }
}

fn load_table_config(path: Option<&Path>) -> CliResult<TableConfig> {
    let Some(path) = path else {
        return Ok(TableConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: TableConfig = serde_yaml::from_str(&content)?;
    debug!(?config, "loaded table config");
    Ok(config)
}

fn state_input(args: &StateArgs) -> CliResult<StateInput> {
    let t = k(parse_quantity(&args.t, Quantity::Temperature)?);
    match (&args.p, &args.rho, &args.rhomolar) {
        (Some(p), None, None) => Ok(StateInput::PT {
            p: pa(parse_quantity(p, Quantity::Pressure)?),
            t,
        }),
        (None, Some(rho), None) => Ok(StateInput::DmassT {
            rhomass: kg_per_m3(parse_quantity(rho, Quantity::Density)?),
            t,
        }),
        (None, None, Some(rho)) => Ok(StateInput::DmolarT {
            rhomolar: mol_per_m3(parse_quantity(rho, Quantity::MolarDensity)?),
            t,
        }),
        _ => Err(CliError::InvalidInput(
            "give exactly one of --p, --rho, --rhomolar".to_string(),
        )),
    }
}

/// Construct the backend, apply fractions and move it to the requested state.
fn prepare(args: &StateArgs) -> CliResult<Box<dyn FluidBackend>> {
    let config = load_table_config(args.table_config.as_deref())?;
    let mut backend = construct_with_config(&args.backend, &args.fluid, &config)?;
    if !args.fractions.is_empty() {
        if backend.using_mass_fractions() {
            backend.set_mass_fractions(&args.fractions)?;
        } else {
            backend.set_mole_fractions(&args.fractions)?;
        }
    }
    backend.update(state_input(args)?)?;
    Ok(backend)
}

fn parse_key(key: &str) -> CliResult<Parameter> {
    Ok(key.trim().parse::<Parameter>()?)
}

fn cmd_props(args: &StateArgs, keys: &[String]) -> CliResult<()> {
    let keys: Vec<Parameter> = if keys.is_empty() {
        vec![
            Parameter::T,
            Parameter::P,
            Parameter::Dmolar,
            Parameter::Dmass,
            Parameter::Hmolar,
            Parameter::Smolar,
            Parameter::Cpmolar,
            Parameter::SpeedSound,
        ]
    } else {
        keys.iter().map(|k| parse_key(k)).collect::<CliResult<_>>()?
    };

    let mut backend = prepare(args)?;
    let mut report = PropsReport {
        backend: backend.backend_name().to_string(),
        fluid: backend.name(),
        phase: backend.phase().ok().map(|p| p.to_string()),
        values: BTreeMap::new(),
        unavailable: BTreeMap::new(),
    };
    for key in keys {
        match backend.keyed_output(key) {
            Ok(value) => {
                report.values.insert(key.to_string(), value);
            }
            Err(e) if e.is_not_implemented() => {
                report.unavailable.insert(key.to_string(), e.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if args.yaml {
        print!("{}", serde_yaml::to_string(&report)?);
        return Ok(());
    }
    println!("{} [{}]", report.fluid, report.backend);
    if let Some(phase) = &report.phase {
        println!("  phase: {phase}");
    }
    for (key, value) in &report.values {
        println!("  {key:<16} {value:.6e}");
    }
    for (key, reason) in &report.unavailable {
        println!("  {key:<16} n/a ({reason})");
    }
    Ok(())
}

fn cmd_deriv(
    args: &StateArgs,
    of: &str,
    wrt: &str,
    constant: &str,
    second: Option<(String, String)>,
) -> CliResult<()> {
    let (of, wrt, constant) = (parse_key(of)?, parse_key(wrt)?, parse_key(constant)?);
    let mut backend = prepare(args)?;
    let (label, value) = match second {
        Some((wrt2, constant2)) => {
            let (wrt2, constant2) = (parse_key(&wrt2)?, parse_key(&constant2)?);
            let value = backend.second_partial_deriv(of, wrt, constant, wrt2, constant2)?;
            (format!("d/d{wrt2}|{constant2} (d{of}/d{wrt})|{constant}"), value)
        }
        None => {
            let value = backend.first_partial_deriv(of, wrt, constant)?;
            (format!("(d{of}/d{wrt})|{constant}"), value)
        }
    };
    if args.yaml {
        let mut map = BTreeMap::new();
        map.insert(label, value);
        print!("{}", serde_yaml::to_string(&map)?);
    } else {
        println!("{label} = {value:.9e}");
    }
    Ok(())
}

fn cmd_backends() {
    println!("Backends:");
    for token in BACKEND_TOKENS {
        println!("  {token}");
    }
    println!("Pure fluids (HEOS, COOLPROP):");
    for species in Species::ALL {
        println!("  {}", species.key());
    }
    println!("Solutions (NAME-xx% or NAME[x]):");
    for solution in Solution::ALL {
        println!(
            "  {:<6} {} (max {:.0}%)",
            solution.key(),
            solution.family().token(),
            solution.max_fraction() * 100.0
        );
    }
}
