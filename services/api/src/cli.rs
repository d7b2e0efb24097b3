use crate::demo::{run_demo, run_resident_import, DemoArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use village_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Village Portal",
    about = "Run the Grama Niladhari village portal or walk through it from the command line",
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
    /// Resident directory maintenance
    Residents {
        #[command(subcommand)]
        command: ResidentsCommand,
    },
    /// Run an end-to-end certificate walkthrough against in-memory storage
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ResidentsCommand {
    /// Validate a resident CSV export and report what would be registered
    Import(ImportArgs),
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
        Command::Residents {
            command: ResidentsCommand::Import(args),
        } => run_resident_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
