//! Logger set-up for the command-line and HTTP entry points.
//!
//! The level comes from the `EPISIM_LOG_LEVEL` environment variable if set, then from the
//! caller (e.g. a `--log-level` flag), then defaults to `info`. Warnings and errors go to
//! stderr, everything else to stdout. If a log directory is given, a plain copy of every
//! message is also written to `episim.log` there.
use anyhow::{bail, Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVEL_ENV_VAR: &str = "EPISIM_LOG_LEVEL";

const LOG_FILE_NAME: &str = "episim.log";

pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    Ok(match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {}", unknown),
    })
}

/// Initialise the global logger. Calling it again is a no-op.
pub fn init(level_from_caller: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    if is_logger_initialised() {
        return Ok(());
    }

    let level = env::var(LOG_LEVEL_ENV_VAR)
        .unwrap_or_else(|_| level_from_caller.unwrap_or(DEFAULT_LOG_LEVEL).to_string());
    let level = parse_level(&level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour_stdout = std::io::stdout().is_terminal();
    let use_colour_stderr = std::io::stderr().is_terminal();

    let mut dispatch = Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stdout, &colours);
                })
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, use_colour_stderr, &colours);
                })
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        );

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("create log dir failed ({})", dir.display()))?;
        let path = dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("open log file failed ({})", path.display()))?;
        dispatch = dispatch.chain(Dispatch::new().format(write_log_plain).level(level).chain(file));
    }

    dispatch.apply().context("logger already initialised")?;
    let _ = LOGGER_INIT.set(());

    Ok(())
}

fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
