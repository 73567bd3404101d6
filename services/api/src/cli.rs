use clap::{Args, Parser, Subcommand};
use workline::error::AppError;

use crate::demo::{run_demo, run_payout_report, DemoArgs, PayoutReportArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Workline Booking Engine",
    about = "Run and exercise the Workline booking lifecycle engine",
    version
)]
struct Cli {
    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service
    Serve(ServeArgs),
    /// Finance-facing exports over a seeded demo portfolio
    Payouts {
        #[command(subcommand)]
        command: PayoutsCommand,
    },
    /// Walk a booking end to end on the command line
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PayoutsCommand {
    /// Render the payout reconciliation CSV
    Report(PayoutReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Bind host, overriding `APP_HOST`
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Bind port, overriding `APP_PORT`
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    match Cli::parse().command {
        None => server::run(ServeArgs::default()).await,
        Some(Command::Serve(args)) => server::run(args).await,
        Some(Command::Payouts {
            command: PayoutsCommand::Report(args),
        }) => run_payout_report(args),
        Some(Command::Demo(args)) => run_demo(args),
    }
}
