#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use elicit_harness::offline::attributes::{default_attribute_specs, load_attribute_specs};
use elicit_harness::simulation::run_synthetic_suite;
use elicit_harness::{
    build_catalogs_seeded, encode_profile, Dimension, EngineConfig, JobProfile, VignetteCatalogs,
};

#[derive(Parser)]
#[command(name = "elicit", version, about = "Adaptive preference elicitation CLI")]
struct Cli {
    /// Log level for the elicit crates (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static and adaptive vignette catalogs
    BuildCatalogs {
        /// Attribute specification JSON (defaults to the bundled job attributes)
        #[arg(long)]
        attributes: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory for the catalog files and manifest
        #[arg(long)]
        out: PathBuf,
        /// Overrides `offline.seed`
        #[arg(long)]
        seed: Option<u64>,
        /// Write the build report JSON here
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Encode a job profile JSON object into the 7 preference dimensions
    Encode {
        #[arg(long)]
        profile: PathBuf,
    },
    /// Run synthetic respondents through built catalogs
    Simulate {
        /// Directory written by build-catalogs
        #[arg(long)]
        catalogs: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        respondent: Option<String>,
        /// JSONL output, one result per respondent
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        curve_csv: Option<PathBuf>,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "elicit_harness={level},elicit={level}",
            level = cli.log_level.to_lowercase()
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("elicit v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::BuildCatalogs {
            attributes,
            config,
            out,
            seed,
            report,
        } => {
            let mut cfg = load_config(config)?;
            if let Some(seed) = seed {
                cfg.offline.seed = seed;
            }
            let specs = match attributes {
                Some(path) => load_attribute_specs(path)?,
                None => default_attribute_specs(),
            };
            let (catalogs, build_report) = build_catalogs_seeded(&specs, &cfg.prior, &cfg.offline)?;
            for warning in &build_report.warnings {
                warn!("{warning}");
            }
            catalogs.write_dir(&out)?;
            if let Some(report_path) = report {
                std::fs::write(report_path, serde_json::to_string_pretty(&build_report)?)?;
            }
            println!(
                "wrote {} beginning, {} end and {} adaptive vignettes to {}",
                catalogs.static_vignettes_beginning.len(),
                catalogs.static_vignettes_end.len(),
                catalogs.adaptive_library.len(),
                out.display()
            );
        }
        Commands::Encode { profile } => {
            let raw = std::fs::read_to_string(&profile)?;
            let parsed: JobProfile = serde_json::from_str(&raw)?;
            let encoded = encode_profile(&parsed);
            let named: BTreeMap<&str, f64> = Dimension::ALL
                .iter()
                .map(|d| (d.as_str(), encoded[d.index()]))
                .collect();
            println!("{}", serde_json::to_string_pretty(&named)?);
        }
        Commands::Simulate {
            catalogs,
            config,
            respondent,
            out,
            curve_csv,
        } => {
            let cfg = load_config(config)?;
            let catalogs = VignetteCatalogs::read_dir(&catalogs)?;
            let results = run_synthetic_suite(&catalogs, &cfg, respondent.as_deref())?;
            if results.is_empty() {
                return Err("no synthetic respondent matched --respondent".into());
            }
            let mut file = File::create(out)?;
            for result in &results {
                let line = serde_json::to_string(result)?;
                writeln!(file, "{line}")?;
            }
            if let Some(csv_path) = curve_csv {
                let mut csv = File::create(csv_path)?;
                writeln!(csv, "respondent,step,rmse")?;
                for result in &results {
                    for (idx, err) in result.error_trajectory.iter().enumerate() {
                        writeln!(csv, "{},{},{}", result.respondent, idx, err)?;
                    }
                }
            }
        }
    }

    Ok(())
}
