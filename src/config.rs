use crate::database::SqliteKeyStore;
use crate::errors::StoreError;
use crate::store::{KeyStore, MemoryKeyStore};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};

/// Short key issuing service
#[derive(Debug, Clone, Parser)]
#[command(name = "keygen-api")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen for HTTP requests on
    #[arg(short, long, env = "KEYGEN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "KEYGEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Backend holding issued keys
    #[arg(long, env = "KEYGEN_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// Log filter, e.g. `info` or `keygen_api=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

impl StoreKind {
    pub fn open(self) -> Result<Box<dyn KeyStore>, StoreError> {
        Ok(match self {
            StoreKind::Memory => Box::new(MemoryKeyStore::new()),
            StoreKind::Sqlite => Box::new(SqliteKeyStore::new()?),
        })
    }
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["keygen-api"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn flags() {
        let config =
            Config::try_parse_from(["keygen-api", "-p", "9000", "--store", "sqlite"]).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.store, StoreKind::Sqlite);
    }
}
