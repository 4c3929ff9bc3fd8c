//! clawsweep CLI - Parallel Parameter Sweeps for Clawpack
//!
//! Runs a sweep's cases on several worker processes. The same binary is
//! re-executed with the hidden `worker` subcommand for each worker.

use clap::Parser;
use clawsweep::config::{CliArgs, RunArgs};
use clawsweep::core::{run_worker, CaseRunner, SelfExecLauncher, WorkerAssignment};
use clawsweep::error::Result;
use clawsweep::interact::{AssumeYes, LinePrompter, Prompter};
use clawsweep::progress::PoolProgress;
use clawsweep::sweep::SweepSpec;
use clawsweep::system::CancelToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG overrides -v
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    match (args.command.run_args(), args.command.to_spec()?) {
        (Some(run_args), Some(spec)) => cmd_sweep(&args, run_args, spec),
        _ => cmd_worker(),
    }
}

fn cmd_sweep(args: &CliArgs, run_args: &RunArgs, spec: SweepSpec) -> Result<()> {
    let cpus = num_cpus::get();
    if run_args.nprocs > cpus {
        warn!(
            "{} processes requested but only {} CPUs available",
            run_args.nprocs, cpus
        );
    }

    let driver = spec.driver();
    info!("Starting {} sweep on {} processes", driver.name(), run_args.nprocs);
    driver.before_run()?;
    let cases = driver.make_all_cases()?;

    let mut line_prompter;
    let mut assume_yes = AssumeYes;
    let prompter: &mut dyn Prompter = if run_args.yes {
        &mut assume_yes
    } else {
        line_prompter = LinePrompter::stdio();
        &mut line_prompter
    };

    let launcher = SelfExecLauncher::current(spec.clone())?.with_args(args.worker_args());
    let summary = CaseRunner::new(run_args.nprocs, prompter)
        .with_signal_handler()
        .with_progress(PoolProgress::for_terminal(args.quiet))
        .run_many_cases(cases, &launcher)?;

    if !args.quiet {
        summary.print_summary();
    }
    summary.into_result()?;

    println!("Done...");
    Ok(())
}

fn cmd_worker() -> Result<()> {
    let cancel = CancelToken::new();
    cancel.install_signal_handler()?;

    let assignment = WorkerAssignment::read_from(std::io::stdin().lock())?;
    info!(
        "Worker {} received {} cases",
        assignment.worker_id,
        assignment.cases.len()
    );
    run_worker(&assignment, &cancel)
}
