use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowwatch_client::{ApiClient, BaseUrl, MonitorApi};
use flowwatch_console::{
    console::{run_console, snapshot_report},
    logging::{init_logging, LogTarget},
    ActionOutcome, ConsoleConfig, ControlInputs, DashboardController, Trigger,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "flowwatch-console")]
#[command(about = "Terminal dashboard for the FlowWatch network monitor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: <config dir>/flowwatch/console.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL; empty means the configured origin.
    #[arg(long)]
    api_url: Option<String>,

    /// Refresh interval in seconds.
    #[arg(long)]
    interval: Option<u64>,

    /// Start with auto-refresh switched off.
    #[arg(long)]
    no_auto_refresh: bool,

    /// Write logs here while the dashboard is open.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default).
    Console,

    /// Run one load cycle and print the tables and chart data.
    Snapshot,

    /// Block an address, then print the refreshed blocked list.
    Block { ip: String },

    /// Unblock an address, then print the refreshed blocked list.
    Unblock { ip: String },
}

impl Cli {
    fn apply_overrides(&self, config: &mut ConsoleConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(secs) = self.interval {
            config.refresh.interval_secs = secs;
        }
        if self.no_auto_refresh {
            config.refresh.auto_refresh = false;
        }
        if let Some(path) = &self.log_file {
            config.logging.file = Some(path.clone());
        }
        match self.verbose {
            0 => {}
            1 => config.logging.level = "debug".into(),
            _ => config.logging.level = "trace".into(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply_overrides(&mut config);

    let command = cli.command.unwrap_or(Commands::Console);
    let target = match (&command, &config.logging.file) {
        (Commands::Console, Some(path)) => LogTarget::File(path.clone()),
        (Commands::Console, None) => LogTarget::Discard,
        _ => LogTarget::Stderr,
    };
    // Before validation, so element warnings are recorded.
    init_logging(&config.logging.level, target)?;
    let elements = config.validate().context("validating configuration")?;

    let api_url = BaseUrl::new(config.api.base_url.clone());
    let client = ApiClient::new(api_url.clone(), config.client_settings())
        .context("building HTTP client")?;
    let api: Arc<dyn MonitorApi> = Arc::new(client);
    let inputs = ControlInputs {
        api_url,
        auto_refresh: config.refresh.auto_refresh,
        ip_input: String::new(),
    };

    info!(
        base_url = %inputs.api_url.raw(),
        origin = %config.api.origin,
        interval_secs = config.refresh.interval_secs,
        "Starting FlowWatch console"
    );

    let mut controller =
        DashboardController::new(api, inputs, elements, config.controller_settings());

    match command {
        Commands::Console => {
            run_console(controller).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Snapshot => {
            controller.request_cycle(Trigger::Manual);
            controller.settle().await;
            print!("{}", snapshot_report(controller.view(), controller.elements()));
            if controller.view().last_error.is_some() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Block { ip } => {
            let outcome = controller.handle_block(&ip).await;
            finish_action(&mut controller, outcome).await
        }
        Commands::Unblock { ip } => {
            let outcome = controller.handle_unblock(&ip).await;
            finish_action(&mut controller, outcome).await
        }
    }
}

async fn finish_action(
    controller: &mut DashboardController,
    outcome: ActionOutcome,
) -> Result<ExitCode> {
    match outcome {
        ActionOutcome::Skipped => {
            eprintln!("No IP address given");
            Ok(ExitCode::FAILURE)
        }
        ActionOutcome::Completed { ok, status, .. } => {
            println!("{status}");
            controller.settle().await;
            let view = controller.view();
            match &view.last_error {
                Some(err) => eprintln!("{err}"),
                None => print!("\n{}", view.blocked_table.to_text()),
            }
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
