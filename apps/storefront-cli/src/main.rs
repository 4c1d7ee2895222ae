use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod check;
mod columns;
mod common;
mod exec;
mod logging;
mod offers;

/// Storefront database tools
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(name = "storefront")]
struct Cli {
    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the columns of a table
    Columns(columns::ColumnsArgs),
    /// Run one SQL statement and print the rows as JSON lines
    Exec(exec::ExecArgs),
    /// Render the special offers list
    Offers(offers::OffersArgs),
    /// Validate configuration and try every configured connection
    Check(check::CheckArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Columns(args) => args.run().await,
        Commands::Exec(args) => args.run().await,
        Commands::Offers(args) => args.run().await,
        Commands::Check(args) => args.run().await,
    }
}
