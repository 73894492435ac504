use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use entrypoint_manifest::integrity::{AssetStatus, verify_entrypoints};
use entrypoint_manifest::render::{render_category, render_entrypoint};
use entrypoint_manifest::{Entrypoints, ResolverConfig};

/// Inspect bundler asset manifests and the entrypoints they declare
#[derive(Parser)]
#[command(name = "entrypoint-manifest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing entrypoints.config.json (default: current directory)
    #[arg(short, long, global = true, default_value = ".")]
    config: PathBuf,

    /// Manifest file, overriding the configured path
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entrypoint names
    List,

    /// Print a resolved entrypoint as JSON
    Show {
        /// Entrypoint name
        name: String,
    },

    /// Print the tags embedding an entrypoint
    Tags {
        /// Entrypoint name
        name: String,

        /// Only render this category (js or css)
        #[arg(long)]
        category: Option<String>,
    },

    /// Check emitted files against their recorded integrity digests
    Verify {
        /// Directory holding the emitted files, overriding the configured path
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let config = ResolverConfig::discover(&cli.config);
    let manifest_path = cli
        .manifest
        .clone()
        .unwrap_or_else(|| config.manifest_file(&cli.config));
    let entrypoints = Entrypoints::from_path(&manifest_path)
        .with_context(|| format!("failed to resolve manifest {}", manifest_path.display()))?;

    match cli.command {
        Commands::List => {
            for name in entrypoints.names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { name } => {
            let entrypoint = entrypoints.get(&name)?;
            let json = serde_json::to_string_pretty(entrypoint)
                .context("failed to serialise entrypoint")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tags { name, category } => {
            let entrypoint = entrypoints.get(&name)?;
            let options = config.render_options();
            let html = match category {
                Some(category) => {
                    let assets = entrypoint.get(&category).with_context(|| {
                        format!("entrypoint {name} has no `{category}` assets")
                    })?;
                    render_category(&category, assets, &options)
                }
                None => render_entrypoint(entrypoint, &options),
            };
            print!("{html}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { public_dir } => {
            let public_dir = public_dir.unwrap_or_else(|| config.public_dir_path(&cli.config));
            let report = verify_entrypoints(&entrypoints, &public_dir);

            for failure in report.failures() {
                println!(
                    "{} [{}] {}: {:?}",
                    failure.entrypoint, failure.category, failure.src, failure.status
                );
            }
            println!(
                "{} verified, {} without integrity, {} failed",
                report.count(|status| *status == AssetStatus::Verified),
                report.count(|status| *status == AssetStatus::MissingIntegrity),
                report.failures().count()
            );

            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
