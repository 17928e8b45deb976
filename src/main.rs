//! Hostfleet CLI entrypoint.
//!
//! This is the main entrypoint for the hostfleet command-line tool.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use hostfleet::cli::{Cli, Commands, OutputFormatter};
use hostfleet::error::{HostfleetError, Result};
use hostfleet::inventory::{find_hosts_file, HostsCompiler, InventoryHasher};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Dispatches the parsed command.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let compiler = build_compiler(&cli.vars)?;

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate => cmd_validate(cli.file.as_ref(), &compiler, &formatter),
        Commands::Show { host } => {
            cmd_show(cli.file.as_ref(), host.as_deref(), &compiler, &formatter)
        }
    }
}

/// Builds a compiler carrying the inventory-scoped `--var` definitions.
fn build_compiler(vars: &[String]) -> Result<HostsCompiler> {
    let mut compiler = HostsCompiler::new();
    for spec in vars {
        let Some((name, value)) = spec.split_once('=') else {
            return Err(HostfleetError::internal(format!(
                "invalid --var '{spec}', expected NAME=VALUE"
            )));
        };
        compiler = compiler.with_variable(name, "inventory-scoped variable", value);
    }
    Ok(compiler)
}

/// Initialize a new hosts file.
fn cmd_init(path: &PathBuf, force: bool) -> Result<()> {
    info!("Initializing hosts file in: {}", path.display());

    let hosts_path = path.join("hosts.yaml");
    if !force && hosts_path.exists() {
        eprintln!("Hosts file already exists: {}", hosts_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    let template = include_str!("../templates/hosts.yaml");
    std::fs::write(&hosts_path, template)?;
    eprintln!("Created: {}", hosts_path.display());

    eprintln!("\nNext steps:");
    eprintln!("  1. Edit hosts.yaml with your machines");
    eprintln!("  2. Run 'hostfleet validate' to check the inventory");
    eprintln!("  3. Run 'hostfleet show' to inspect the compiled hosts");

    Ok(())
}

/// Compile the inventory and report a summary.
fn cmd_validate(
    file: Option<&PathBuf>,
    compiler: &HostsCompiler,
    formatter: &OutputFormatter,
) -> Result<()> {
    let hosts_file = resolve_hosts_path(file)?;
    info!("Validating hosts: {}", hosts_file.display());

    let hosts = compiler.compile_file(&hosts_file)?;
    let logical: HashSet<usize> = hosts.iter().map(hostfleet::HostConfig::sequence).collect();

    let hasher = InventoryHasher::new();
    let fingerprint = hasher.hash_inventory(&hosts);

    eprintln!(
        "{}",
        formatter.format_summary(logical.len(), hosts.len(), &fingerprint)
    );
    Ok(())
}

/// Compile the inventory and display every replica.
fn cmd_show(
    file: Option<&PathBuf>,
    host_filter: Option<&str>,
    compiler: &HostsCompiler,
    formatter: &OutputFormatter,
) -> Result<()> {
    let hosts_file = resolve_hosts_path(file)?;

    let mut hosts = compiler.compile_file(&hosts_file)?;
    if let Some(name) = host_filter {
        hosts.retain(|hc| hc.host() == name);
    }

    eprintln!("{}", formatter.format_hosts(&hosts));
    Ok(())
}

/// Resolves the hosts file path.
fn resolve_hosts_path(file: Option<&PathBuf>) -> Result<PathBuf> {
    file.map_or_else(|| find_hosts_file("."), |path| Ok(path.clone()))
}
