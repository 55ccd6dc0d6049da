use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use podsmoke::cli::Args;
use podsmoke::config::{RunConfig, Settings};
use podsmoke::container::{CancelToken, CliRuntime};
use podsmoke::logs::{LogLayout, init_tracing};
use podsmoke::pipeline::run_smoke_test;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<u8> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let settings = Settings::discover(args.config.as_deref(), &cwd)?;
    let config = RunConfig::resolve(&args, &settings)?;
    let runtime = CliRuntime::parse(args.runtime.as_deref().unwrap_or(&settings.runtime))?;

    let layout = LogLayout::prepare(&config.logs_dir)?;
    init_tracing(&layout.master)?;
    let journal = layout.journal();

    // Ctrl+C only flips the token; the stream loop notices within one poll
    // and the container is still stopped.
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("failed to install Ctrl+C handler")?;

    info!("Starting test for app: {}", config.image);
    if let Some(dataset) = &config.dataset {
        info!("Using dataset: {}", dataset.display());
    }
    if let Some(base) = &config.base_dir {
        info!("Using base directory: {}", base.display());
    }
    if let Some(scripts) = &config.testscript {
        info!("Test script directory: {}", scripts.display());
    }
    info!("Master log: {}", layout.master.display());

    // Release builds abort on panic, so the guard's Drop never runs there.
    #[cfg(panic = "abort")]
    let panic_stop = podsmoke::container::stop_on_panic(
        runtime.clone(),
        podsmoke::container::ContainerHandle::for_image(&config.image),
    );

    let report = run_smoke_test(&runtime, &config, &journal, &cancel);

    #[cfg(panic = "abort")]
    panic_stop.disarm();

    if report.outcome.passed() {
        info!("Test completed successfully.");
        journal.note("Test completed successfully.");
        journal.verdict("Test completed successfully.");
    } else {
        error!(outcome = %report.outcome, "Test failed. Check logs for details.");
        journal.note("Test failed. Check logs for details.");
        journal.verdict("Test failed. Check logs for details.");
    }

    Ok(report.exit_code())
}
