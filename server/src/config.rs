//! Command-line configuration for the game hall server.

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    pub port: u16,
    /// Maximum number of connected clients
    #[clap(short, long, default_value = "64")]
    pub max_clients: usize,
    /// Interval between timeout and negotiation sweeps, in milliseconds
    #[clap(long, default_value = "1000")]
    pub sweep_ms: u64,
    /// Seconds of silence before a client is dropped
    #[clap(long, default_value = "30")]
    pub client_timeout_secs: u64,
    /// Seconds an undo or draw request stays open
    #[clap(long, default_value = "60")]
    pub negotiation_timeout_secs: u64,
    /// Random room id draws before room creation fails
    #[clap(long, default_value = "10")]
    pub room_id_attempts: usize,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_ms.max(1))
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn negotiation_ttl(&self) -> Duration {
        Duration::from_secs(self.negotiation_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_clients: 64,
            sweep_ms: 1000,
            client_timeout_secs: 30,
            negotiation_timeout_secs: 60,
            room_id_attempts: 10,
        }
    }
}
