//! Command-line configuration surface.

use clap::Parser;
use protocol::{DEFAULT_HOST, DEFAULT_PORT};

/// Authoritative game server. Binds a TCP listener and accepts players
/// and spectators until interrupted.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct ServerConfig {
    /// Host or address to bind.
    #[arg(default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind.
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
