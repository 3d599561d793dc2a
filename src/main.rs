use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fmu_aasx::{ToolConfig, WriteOptions};

#[derive(Parser, Debug)]
#[command(
    name = "fmu-to-aasx",
    version,
    about = "Package FMU interface variables into AASX simulation models"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write each submodel to its own spec part
    #[arg(long, global = true)]
    split_submodels: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Build a new package for an FMU: <aas_id_short> <fmu> <output>
    Build {
        aas_id_short: String,
        fmu: PathBuf,
        output: PathBuf,
    },

    /// Replace the ports of a simulation model in an existing package
    Patch {
        input: PathBuf,
        fmu: PathBuf,
        /// Identifier of the submodel holding the simulation model
        submodel: String,
        /// id_short path of the simulation model collection (`a.b.c`)
        collection: String,
        output: PathBuf,
    },

    /// List the interface variables of an FMU
    Variables {
        fmu: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ToolConfig> {
    let mut config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    };
    if cli.split_submodels {
        config.write.submodel_split_parts = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;
    let options: WriteOptions = config.write;

    match cli.cmd {
        Cmd::Build {
            aas_id_short,
            fmu,
            output,
        } => {
            let store = fmu_aasx::build_package(&aas_id_short, &fmu, &config.mapping)
                .with_context(|| format!("building package from {}", fmu.display()))?;
            fmu_aasx::write_aasx_file(&output, &store, &options)?;
            println!("Wrote {}", output.display());
        }

        Cmd::Patch {
            input,
            fmu,
            submodel,
            collection,
            output,
        } => {
            let report = fmu_aasx::add_ports_to_existing_aasx(
                &input,
                &fmu,
                &submodel,
                &collection,
                &output,
                &options,
            )
            .with_context(|| format!("patching {}", input.display()))?;
            println!(
                "{} {} ports in {} -> {}",
                if report.replaced { "Replaced" } else { "Added" },
                report.ports,
                report.collection,
                report.output.display()
            );
        }

        Cmd::Variables { fmu, json } => {
            let variables = fmu_aasx::parse_model_variables(&fmu)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&variables)?);
            } else {
                for v in &variables {
                    println!(
                        "{}\t{}\t{}\t{}",
                        v.name, v.declared_type, v.causality, v.unit
                    );
                }
            }
        }
    }

    Ok(())
}
