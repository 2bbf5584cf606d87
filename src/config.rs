use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SESSION_TTL;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Root directory for the catalog database and the asset container.
    pub data_dir: PathBuf,
    /// Sliding lifetime for capability tokens.
    pub session_ttl: Duration,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("shellac.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl: SESSION_TTL,
        }
    }
}
