//! Diagnostics setup.
//!
//! Diagnostics go to stderr at `warn` unless `RUST_LOG` says otherwise. With
//! `--log <file>` they are appended to that file instead, at `debug` for this
//! crate, so the chat transcript on stdout stays clean.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const STDERR_FILTER: &str = "warn";
const FILE_FILTER: &str = "campus_chat=debug,warn";

pub fn init_tracing(log_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(FILE_FILTER))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| -> Box<dyn Error> { e })?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(STDERR_FILTER))
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| -> Box<dyn Error> { e })?;
        }
    }
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file(path: &str) -> Result<File, Box<dyn Error>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(Path::new(path))
        .map_err(|e| format!("Cannot write to log file '{path}': {e}").into())
}
