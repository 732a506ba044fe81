use clap::{Parser, Subcommand};
use org_warden_cli::commands::{apply_cmd, dump_cmd};
use org_warden_cli::errors::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ORG_WARDEN_LOG";

/// OrgWarden CLI: Keep GitHub organizations in line with a declared configuration
#[derive(Parser, Debug)]
#[command(name = "org-warden")]
#[command(about = "Keep GitHub organizations in line with a declared configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile organizations with a configuration document
    Apply(apply_cmd::ApplyArgs),

    /// Print the live state of an organization as configuration
    Dump(dump_cmd::DumpArgs),

    /// Show the CLI version
    Version,
}

async fn run(command: &Commands) -> Result<(), Error> {
    match command {
        Commands::Apply(args) => apply_cmd::execute(args).await,
        Commands::Dump(args) => {
            let yaml = dump_cmd::execute(args).await?;
            print!("{}", yaml);
            Ok(())
        }
        Commands::Version => {
            println!(
                "org-warden version {}",
                option_env!("ORG_WARDEN_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `dump` output stays clean.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli.command).await {
        error!("Error: {e}");
        std::process::exit(1);
    }
}
