//! Modelsmith Code Generator
//!
//! Generates request contexts, media types and storage models from designs.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use modelsmith_define::ApiDefinition;
use modelsmith_definitions::{DESIGNS, design_by_name};
use modelsmith_gen::cargo_gen::write_cargo_toml;
use modelsmith_gen::config::GeneratorConfig;
use modelsmith_gen::errors::GeneratorError;
use modelsmith_gen::generator::Generator;
use modelsmith_gen::output::write_atomic;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Modelsmith code generator - transforms designs into contexts, media types and models
#[derive(Parser, Debug)]
#[command(name = "modelsmith-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Design to generate code for: a built-in name (e.g., "cellar") or a JSON file
    #[arg(short, long)]
    design: String,

    /// Output directory for generated code (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Also write a Cargo.toml next to the output directory
    #[arg(long)]
    cargo: bool,

    /// Write every generated module into this single file as well
    #[arg(long)]
    bundle: Option<PathBuf>,

    /// Render artifacts one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Installs the tracing subscriber; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8, json: bool) {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_string()
    });
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn load_design(design: &str) -> Result<ApiDefinition, GeneratorError> {
    if let Some(api) = design_by_name(design) {
        return Ok(api);
    }
    let path = Path::new(design);
    if !path.exists() {
        return Err(GeneratorError::ConfigError(format!(
            "Unknown design: '{}'. Available designs: {}, or a path to a JSON design",
            design,
            DESIGNS.join(", ")
        )));
    }
    let text = fs::read_to_string(path).map_err(|e| {
        GeneratorError::design(format!("cannot read '{}': {}", path.display(), e))
    })?;
    ApiDefinition::from_json_str(&text).map_err(|e| GeneratorError::design(e.to_string()))
}

fn main() -> Result<(), GeneratorError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if cli.sequential {
        config.parallel = false;
    }
    config.validate()?;

    let api = load_design(&cli.design)?;
    info!(design = %api.name, versions = api.versions.len(), "loaded design");
    for version in &api.versions {
        debug!(
            version = %version.version,
            resources = version.resources.len(),
            media_types = version.media_types.len(),
            user_types = version.user_types.len(),
            "version"
        );
    }
    if cli.dry_run {
        eprintln!("{}", "Dry run mode - no files will be written".yellow());
    }

    let generator = Generator::new(config.clone());
    let artifacts = match generator.generate_and_write(&api, cli.dry_run) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return Err(e);
        }
    };

    if let Some(bundle) = &cli.bundle {
        let code = artifacts.bundle()?;
        if cli.dry_run {
            println!("=== {} ===\n{code}", bundle.display());
        } else {
            write_atomic(bundle, &code)?;
        }
    }

    if cli.cargo {
        // output_dir points at src/, the manifest goes into its parent
        let package_dir = config
            .output_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        write_cargo_toml(package_dir, &config, cli.dry_run)?;
    }

    if !cli.dry_run {
        eprintln!(
            "{} {} files for '{}' into {}",
            "Generated".green().bold(),
            artifacts.len(),
            api.name,
            config.output_dir.display()
        );
    }

    Ok(())
}
