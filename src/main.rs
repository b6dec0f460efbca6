//! transfer-loop
//!
//! Sends the same native-currency transfer N times from one key, waiting for
//! each transaction to confirm before broadcasting the next.
//!
//! # Architecture Overview
//!
//! ```text
//!   config file ──▶ config ──▶ CLI overrides ──▶ validation
//!                                                    │
//!   env var (key) ──▶ Credential                     ▼
//!                        │                     LoopSettings
//!                        ▼                           │
//!   ┌──────────────────────────────────────────────────────────┐
//!   │                     TransferLoop                         │
//!   │   connect ─▶ derive signer ─▶ [ submit ─▶ confirm ] × N  │
//!   │                                   │          │           │
//!   │                          policy: retry / skip / abort    │
//!   └──────────────────────────────────────────────────────────┘
//!          │                    │                    │
//!     AlloyChainClient      observability         lifecycle
//!     (JSON-RPC)            (tracing, metrics)    (Ctrl-C → cancel)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use transfer_loop::blockchain::{AlloyChainClient, Credential, NamedNetwork, RpcSettings};
use transfer_loop::config::{
    read_config, validate_config, ConfigError, FailurePolicy, LogFormat, TransferConfig,
};
use transfer_loop::lifecycle::{spawn_signal_listener, Shutdown};
use transfer_loop::observability::{init_logging, metrics};
use transfer_loop::transfer::{LoopError, LoopSettings, RunOutcome, RunReport, TransferLoop};

const EXIT_OK: u8 = 0;
const EXIT_FAILED: u8 = 1;
/// Exit code used when the run is interrupted (128 + SIGINT).
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "transfer-loop", version)]
#[command(about = "Repeatedly send a native-currency transfer and wait for each confirmation", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Named network to use.
    #[arg(long, global = true, value_enum)]
    network: Option<NamedNetwork>,

    /// Custom JSON-RPC URL (overrides --network's endpoint).
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Expected chain ID.
    #[arg(long, global = true)]
    chain_id: Option<u64>,

    /// Number of transfers to send.
    #[arg(short = 'n', long, global = true)]
    iterations: Option<u64>,

    /// Recipient address.
    #[arg(long, global = true)]
    recipient: Option<String>,

    /// Amount per transfer in the native currency, e.g. 0.0001.
    #[arg(long, global = true)]
    amount: Option<String>,

    /// Environment variable holding the private key.
    #[arg(long, global = true)]
    key_env: Option<String>,

    /// Failure handling policy.
    #[arg(long, global = true, value_enum)]
    policy: Option<FailurePolicy>,

    /// Deadline for each confirmation wait, in seconds.
    #[arg(long, global = true)]
    confirmation_timeout_secs: Option<u64>,

    /// Emit JSON log lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print the final run report as JSON on stdout.
    #[arg(long, global = true)]
    report_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the transfer loop (default)
    Run,
    /// Load and validate the configuration without touching the network
    Validate,
    /// List the named networks
    Networks,
}

impl Cli {
    fn apply_overrides(&self, config: &mut TransferConfig) {
        if let Some(network) = self.network {
            config.network.name = network;
        }
        if let Some(url) = &self.rpc_url {
            config.network.rpc_url = Some(url.clone());
        }
        if let Some(chain_id) = self.chain_id {
            config.network.chain_id = Some(chain_id);
        }
        if let Some(iterations) = self.iterations {
            config.transfer.iterations = iterations;
        }
        if let Some(recipient) = &self.recipient {
            config.transfer.recipient = recipient.clone();
        }
        if let Some(amount) = &self.amount {
            config.transfer.amount = amount.clone();
        }
        if let Some(var) = &self.key_env {
            config.credential.env_var = var.clone();
        }
        if let Some(policy) = self.policy {
            config.retries.policy = policy;
        }
        if let Some(secs) = self.confirmation_timeout_secs {
            config.confirmation.timeout_secs = secs;
        }
        if self.json_logs {
            config.observability.log_format = LogFormat::Json;
        }
    }

    fn load(&self) -> Result<TransferConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => TransferConfig::default(),
        };
        self.apply_overrides(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Networks => {
            print_networks();
            ExitCode::SUCCESS
        }
        Commands::Validate => match cli.load() {
            Ok(config) => {
                match config.network.endpoint() {
                    Ok(endpoint) => println!("Configuration OK: {}", endpoint),
                    Err(e) => println!("Configuration OK, but endpoint did not resolve: {}", e),
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Run => match run(&cli).await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "transfer-loop failed");
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = cli.load()?;

    init_logging(&config.observability);
    tracing::info!("transfer-loop v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let settings = LoopSettings::from_config(&config)?;
    tracing::info!(
        endpoint = %settings.endpoint,
        iterations = settings.iterations,
        confirmation_timeout_secs = settings.confirmation_timeout.as_secs(),
        "Configuration loaded"
    );

    let credential = Credential::from_env(&config.credential.env_var)?;
    let client = AlloyChainClient::new(RpcSettings::from_config(&config));

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    let result = TransferLoop::new(client, settings)
        .with_cancellation(shutdown.token())
        .run(credential)
        .await;
    signals.abort();

    let status = exit_status(&result);
    match result {
        Ok(report) => {
            if cli.report_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Err(LoopError::Cancelled) => tracing::warn!("Cancelled before the first transfer"),
        Err(e) => return Err(e.into()),
    }
    Ok(ExitCode::from(status))
}

/// Process exit status for a finished run.
fn exit_status(result: &Result<RunReport, LoopError>) -> u8 {
    match result {
        Ok(report) => match report.outcome {
            RunOutcome::Completed => EXIT_OK,
            RunOutcome::Aborted { .. } => EXIT_FAILED,
            RunOutcome::Cancelled { .. } => EXIT_CANCELLED,
        },
        Err(LoopError::Cancelled) => EXIT_CANCELLED,
        Err(LoopError::Startup(_)) => EXIT_FAILED,
    }
}

fn print_networks() {
    println!("{:<14} {:>10}  RPC URL", "NAME", "CHAIN ID");
    for network in NamedNetwork::ALL {
        println!(
            "{:<14} {:>10}  {}",
            network.as_str(),
            network.chain_id(),
            network.rpc_url()
        );
    }
}
