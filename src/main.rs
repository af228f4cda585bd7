use clap::Parser;
use clap::Subcommand;
use commands::batch::Batch;
use commands::provision::Provision;
use config::Config;
use std::path::PathBuf;

mod commands;
mod config;
mod errors;
mod github;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "ghprovision")]
#[command(about = "Provision per-student GitHub repositories from a template", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate one repository for one student
    Provision(Provision),
    /// Generate one repository per student
    Batch(Batch),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let result = Config::load(&args.config).and_then(|config| match args.command {
        Commands::Provision(provision) => provision.execute(&config),
        Commands::Batch(batch) => batch.execute(&config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
