pub mod interfaces;
pub mod record;

use ifrate_core::{FirstSample, MonitorConfig, parse_duration, parse_interval};

use crate::Cli;

/// Turn parsed arguments into a validated [`MonitorConfig`].
pub fn monitor_config(cli: &Cli) -> ifrate_core::Result<MonitorConfig> {
    let missing = |what: &str| ifrate_core::Error::Usage(format!("missing {what}"));

    let output = cli.outfile.clone().ok_or_else(|| missing("outfile"))?;
    let interval = parse_interval(cli.interval.as_deref().ok_or_else(|| missing("interval"))?)?;
    let interface = cli.interface.clone().ok_or_else(|| missing("interface"))?;
    let max_duration = cli.duration.as_deref().map(parse_duration).transpose()?;
    let first_sample = if cli.emit_first_row {
        FirstSample::Emit
    } else {
        FirstSample::Skip
    };

    let config = MonitorConfig {
        output,
        interval,
        interface,
        first_sample,
        max_duration,
    };
    config.validate()?;
    Ok(config)
}
