#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use slot_logger::logger::{self, parse_size, Config};
use slot_logger::{Level, Slot};
use std::io::{self, BufRead};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct AppArg {
    /// Write to the access log instead of the application log
    #[clap(long)]
    access: bool,
    /// DEBUG, INFO, ERROR or FATAL
    #[clap(long, default_value = "INFO")]
    level: Level,
    /// Overrides LOG_ROTATION_SIZE, e.g. 10MiB
    #[clap(long)]
    rotation_size: Option<String>,
    /// Writes the last line with a Quit prefix and exits with status 1
    #[clap(long)]
    fatal: bool,
}

fn main() -> Result<()> {
    dotenv().ok();
    let arg: AppArg = AppArg::parse();

    let mut config = Config::from_env()?;
    if let Some(size) = &arg.rotation_size {
        config = config.rotation_size(parse_size(size)?);
    }
    let slot = logger::init(config).context("failed to initialize logger")?;
    if !slot.is_log_enabled() {
        warn!("application log is disabled");
    }
    if arg.access && !slot.is_access_enabled() {
        warn!("access log is disabled");
    }

    let mut last: Option<String> = None;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if let Some(prev) = last.replace(line) {
            write(&slot, &arg, &prev);
        }
    }
    if let Some(line) = last {
        if arg.fatal {
            slot.fatal(format_args!("{}", line));
        }
        write(&slot, &arg, &line);
    }
    logger::shutdown();
    Ok(())
}

fn write(slot: &Slot, arg: &AppArg, line: &str) {
    if arg.access {
        slot.access(format_args!("{}", line));
    } else {
        slot.log(arg.level, format_args!("{}", line));
    }
}
