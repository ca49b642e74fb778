//! `ifrate <outfile> <interval> <interface>`: sample until interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ifrate_core::{MonitorConfig, Scheduler, SystemClock, cancellation_flag, system_source};

/// Run the monitor until Ctrl+C, SIGTERM or the configured duration.
pub fn run(config: &MonitorConfig) -> ifrate_core::Result<()> {
    let source = system_source();

    let cancel = cancellation_flag();
    install_signal_handler(cancel.clone())?;

    let scheduler = Scheduler::initialize(config, &*source, SystemClock, cancel)?;

    log::info!("Recording {}", scheduler.handle());
    log::info!("  Output:    {}", config.output.display());
    log::info!("  Interval:  {}s", config.interval.as_secs());
    log::info!("  First row: {}", config.first_sample);
    match config.max_duration {
        Some(d) => log::info!("  Duration:  {}s", d.as_secs()),
        None => log::info!("  Duration:  until Ctrl+C"),
    }

    let summary = scheduler.run()?;
    log::info!(
        "Stopped ({}): {} rows written to {} over {} ticks",
        summary.stopped_by,
        summary.rows_written,
        config.output.display(),
        summary.ticks
    );
    Ok(())
}

/// Raise `flag` on SIGINT or SIGTERM. The loop notices it after its next row.
fn install_signal_handler(flag: Arc<AtomicBool>) -> ifrate_core::Result<()> {
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| ifrate_core::Error::io("install signal handler", std::io::Error::other(e)))
}
