use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing::Level;
use worker_queue::{
    console::{print_summary, ConsoleObserver},
    run_blocking, run_cooperative, Config, Mode,
};

/// Run a batch of simulated tasks through a work queue.
#[derive(Parser)]
#[command(name = "worker-queue", version)]
struct Cli {
    /// Simulated latency of each task, in milliseconds.
    #[arg(long, global = true, default_value_t = 1000)]
    delay_ms: u64,

    /// Give up if the queue has not drained after this many milliseconds.
    #[arg(long, global = true)]
    drain_timeout_ms: Option<u64>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run synchronous blocking tasks.
    Sync(RunArgs),
    /// Run asynchronous non-blocking tasks.
    Async(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Number of tasks to run.
    #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
    num: i64,

    /// Number of workers (default: 1 thread for sync, 3 tasks for async).
    #[arg(short, long)]
    workers: Option<usize>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let base = Config::fast(Duration::from_millis(cli.delay_ms))
        .with_drain_timeout(cli.drain_timeout_ms.map(Duration::from_millis));

    let result = match cli.command {
        Command::Sync(RunArgs { num, workers }) => {
            let config = match workers {
                Some(n) => base.with_sync_workers(n),
                None => base,
            };
            run_blocking(num, &config, Arc::new(ConsoleObserver::new(Mode::Blocking)))
        }
        Command::Async(RunArgs { num, workers }) => {
            let config = match workers {
                Some(n) => base.with_async_workers(n),
                None => base,
            };
            run_cooperative(num, &config, Arc::new(ConsoleObserver::new(Mode::Cooperative)))
        }
    };

    match result {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
