use crate::core::config::data::{
    Config, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SERVER_URL,
};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.server_url {
            Some(url) => println!("  server-url: {url}"),
            None => println!("  server-url: (unset, default {DEFAULT_SERVER_URL})"),
        }
        match self.poll_interval_secs {
            Some(secs) => println!("  poll-interval: {secs}s"),
            None => println!("  poll-interval: (unset, default {DEFAULT_POLL_INTERVAL_SECS}s)"),
        }
        match self.max_poll_attempts {
            Some(attempts) => println!("  max-poll-attempts: {attempts}"),
            None => println!("  max-poll-attempts: (unset, default {DEFAULT_MAX_POLL_ATTEMPTS})"),
        }
    }
}
