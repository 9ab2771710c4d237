use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::warn;
use queue_signal_waiter_core::config::{
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REQUIRED_SIGNALS, DEFAULT_TIMEOUT_MS,
};
use queue_signal_waiter_core::{
    QueueSignalWaiterError, QueueSignalWaiterService, RunResult, ServiceOptions, WaitOptions,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

const EXIT_FAILURE: u8 = 1;
/// Shared with clap's own usage errors.
const EXIT_CONFIG: u8 = 2;
const EXIT_TIMEOUT: u8 = 3;
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "queue-signal-waiter",
    version,
    about = "Block a deployment step until readiness signals arrive on an SQS queue"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait until the required number of signals has been received
    Wait(WaitArgs),
    /// Send readiness signals to a queue
    Signal(SignalArgs),
}

#[derive(Args, Debug)]
struct QueueArgs {
    /// Queue URL, or a queue name to resolve in the target region
    #[arg(long, env = "SIGNAL_QUEUE")]
    queue: String,

    /// AWS region (defaults to the ambient AWS configuration, then us-east-1)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom SQS endpoint, e.g. a local emulator
    #[arg(long, env = "AWS_ENDPOINT_URL_SQS")]
    endpoint_url: Option<String>,
}

impl QueueArgs {
    fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct WaitArgs {
    #[command(flatten)]
    queue: QueueArgs,

    /// Give up after this many milliseconds (10000-3600000)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Long-poll wait per receive call in seconds (1-20)
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval_secs: u64,

    /// Number of signals required before succeeding (1-100)
    #[arg(long, default_value_t = DEFAULT_REQUIRED_SIGNALS)]
    signals: usize,

    /// Leave received messages on the queue
    #[arg(long)]
    no_delete: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

impl WaitArgs {
    fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            queue: self.queue.queue.clone(),
            region: self.queue.region.clone(),
            timeout_ms: self.timeout_ms,
            poll_interval_secs: self.poll_interval_secs,
            required_signals: self.signals,
            delete_messages: !self.no_delete,
        }
    }
}

#[derive(Args, Debug)]
struct SignalArgs {
    #[command(flatten)]
    queue: QueueArgs,

    /// Message body (defaults to "ready")
    #[arg(long)]
    body: Option<String>,

    /// Number of signals to send
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=100))]
    count: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let outcome = match cli.command {
        Commands::Wait(args) => wait(args).await,
        Commands::Signal(args) => signal(args).await,
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = format!("warn,queue_signal_waiter_core={level},queue_signal_waiter={level}");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .init();
}

async fn wait(args: WaitArgs) -> Result<u8> {
    let options = args.wait_options();
    // Reject bad input before touching AWS.
    if let Err(e) = options.validate() {
        eprintln!("Error: {e}");
        return Ok(EXIT_CONFIG);
    }

    let service = QueueSignalWaiterService::new(args.queue.service_options())
        .await
        .context("Failed to initialize service")?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling wait");
            on_interrupt.cancel();
        }
    });

    match service.wait(options, &cancel).await {
        Ok(result) => {
            print_result(&result, args.format)?;
            Ok(0)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(exit_code(&e))
        }
    }
}

async fn signal(args: SignalArgs) -> Result<u8> {
    if args.queue.queue.trim().is_empty() {
        eprintln!("Error: Invalid configuration: queue must not be empty");
        return Ok(EXIT_CONFIG);
    }

    let service = QueueSignalWaiterService::new(args.queue.service_options())
        .await
        .context("Failed to initialize service")?;

    let count = usize::try_from(args.count).context("signal count out of range")?;
    match service
        .signal(&args.queue.queue, args.body.as_deref(), count)
        .await
    {
        Ok(message_ids) => {
            for id in message_ids {
                println!("{id}");
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(exit_code(&e))
        }
    }
}

fn exit_code(err: &QueueSignalWaiterError) -> u8 {
    match err {
        QueueSignalWaiterError::Config(_) => EXIT_CONFIG,
        QueueSignalWaiterError::Timeout { .. } => EXIT_TIMEOUT,
        QueueSignalWaiterError::Cancelled { .. } => EXIT_CANCELLED,
        QueueSignalWaiterError::FatalQueue { .. } | QueueSignalWaiterError::Aws(_) => EXIT_FAILURE,
    }
}

fn print_result(result: &RunResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(result).context("Failed to serialize result")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!(
                "Received {} signal(s) in {:.1}s after {} poll(s)",
                result.signal_count,
                result.elapsed.as_secs_f64(),
                result.polls
            );
            for (i, body) in result.signals.iter().enumerate() {
                println!("  {}: {}", i + 1, body);
            }
            if result.unacknowledged > 0 {
                println!(
                    "  {} signal(s) could not be deleted from the queue",
                    result.unacknowledged
                );
            }
        }
    }
    Ok(())
}
