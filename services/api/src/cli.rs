use crate::commands::{run_lookup, run_report, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use exit_recon::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Employee Exit Reconciliation",
    about = "Reconcile employee offboarding status across downstream systems",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one reconciliation batch, deliver the report, and print a summary
    Report,
    /// Check one employee's status across every configured system
    Lookup(LookupArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report => run_report().await,
        Command::Lookup(args) => run_lookup(args).await,
    }
}
