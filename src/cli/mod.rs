//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod admin;
pub mod say;

use std::error::Error;

use clap::{Parser, Subcommand};

use crate::cli::admin::{run_admin, AdminCommand};
use crate::cli::say::run_say;
use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;
use crate::utils::url::validate_server_url;

#[derive(Parser)]
#[command(name = "campus-chat")]
#[command(version)]
#[command(about = "A terminal client for the campus assistant")]
#[command(
    long_about = "campus-chat talks to a campus assistant server and shows its answers as they \
stream in: a status line while the question is processed and the knowledge base is searched, \
then the answer growing in place, then the sources it came from.\n\n\
Configuration:\n\
  Use 'campus-chat set server-url <url>' to point at your server\n\
  (default http://localhost:5000).\n\n\
Controls:\n\
  Enter             Send the message\n\
  /help             Show help\n\
  /quit, Ctrl+D     Leave the chat\n\n\
Environment Variables:\n\
  RUST_LOG                      Log filter (default: warn)\n\
  CAMPUS_CHAT_ADMIN_PASSWORD    Password for admin commands"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server base URL, overriding the configured one
    #[arg(short = 's', long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Write diagnostics to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Say {
        /// The question; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Manage the server's model and knowledge base
    Admin {
        /// Admin password
        #[arg(long, env = "CAMPUS_CHAT_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(subcommand)]
        command: AdminCommand,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set (server-url, poll-interval, max-poll-attempts)
        key: String,
        /// Value to set for the key; omit to print the current configuration
        value: Option<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async_main(args));
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            run_chat(resolve_server_url(args.server, &config)?).await
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            run_say(prompt, resolve_server_url(args.server, &config)?).await
        }
        Commands::Admin { password, command } => {
            let config = Config::load()?;
            let server_url = resolve_server_url(args.server, &config)?;
            run_admin(&server_url, config.poll_settings(), &password, command).await
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(value) = value else {
                config.print_all();
                return Ok(());
            };
            match key.as_str() {
                "server-url" => {
                    let url = validate_server_url(&value)?;
                    config.server_url = Some(url.clone());
                    config.save()?;
                    println!("✅ Set server-url to: {url}");
                }
                "poll-interval" => {
                    let secs = parse_positive(&key, &value)?;
                    config.poll_interval_secs = Some(secs);
                    config.save()?;
                    println!("✅ Set poll-interval to: {secs}s");
                }
                "max-poll-attempts" => {
                    let attempts = u32::try_from(parse_positive(&key, &value)?)
                        .map_err(|_| format!("max-poll-attempts is too large: {value}"))?;
                    config.max_poll_attempts = Some(attempts);
                    config.save()?;
                    println!("✅ Set max-poll-attempts to: {attempts}");
                }
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "server-url" => config.server_url = None,
                "poll-interval" => config.poll_interval_secs = None,
                "max-poll-attempts" => config.max_poll_attempts = None,
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

fn resolve_server_url(flag: Option<String>, config: &Config) -> Result<String, String> {
    match flag {
        Some(url) => validate_server_url(&url),
        None => Ok(config.server_url().to_string()),
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{key} must be a positive whole number, got: {value}")),
    }
}
