//! Configurazione del server, letta dalle variabili d'ambiente.
//!
//! Ogni chiave ha un default, così il server parte anche senza `.env`.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Env: `GRPC_HOST`, default `0.0.0.0`
    pub grpc_host: IpAddr,
    /// Env: `GRPC_PORT`, default `9090`
    pub grpc_port: u16,
    /// Env: `DATABASE_URL`, default `sqlite://chat_server.db`
    pub database_url: String,
    /// Env: `DB_MAX_CONNECTIONS`, default `10`
    pub db_max_connections: u32,
    /// Env: `BCRYPT_COST`, default `bcrypt::DEFAULT_COST`
    pub bcrypt_cost: u32,
    /// Env: `LOG_DIR`, default `logs`
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grpc_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            grpc_port: 9090,
            database_url: "sqlite://chat_server.db".to_string(),
            db_max_connections: 10,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Carica `.env` (se presente), poi l'eventuale file indicato da
    /// `CHAT_CONFIG_FILE`, e infine legge le variabili d'ambiente.
    ///
    /// Il logging non è ancora attivo: gli avvisi vengono restituiti e il
    /// chiamante li emette dopo aver installato il subscriber.
    pub fn load() -> (Self, Vec<String>) {
        dotenvy::dotenv().ok();
        let mut warnings = Vec::new();
        if let Ok(path) = env::var("CHAT_CONFIG_FILE") {
            if let Err(e) = dotenvy::from_filename(&path) {
                warnings.push(format!("Cannot read config file {path}: {e}"));
            }
        }
        let (config, env_warnings) = Self::from_env();
        warnings.extend(env_warnings);
        (config, warnings)
    }

    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<String>) {
        let mut config = Self::default();
        let mut warnings = Vec::new();

        if let Some(host) = lookup("GRPC_HOST") {
            match host.parse() {
                Ok(parsed) => config.grpc_host = parsed,
                Err(_) => warnings.push(format!("Invalid GRPC_HOST {:?}, using default", host)),
            }
        }

        if let Some(port) = lookup("GRPC_PORT") {
            match port.parse() {
                Ok(parsed) => config.grpc_port = parsed,
                Err(_) => warnings.push(format!("Invalid GRPC_PORT {:?}, using default", port)),
            }
        }

        if let Some(url) = lookup("DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = url;
            }
        }

        if let Some(val) = lookup("DB_MAX_CONNECTIONS") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.db_max_connections = n,
                _ => warnings.push(format!("Invalid DB_MAX_CONNECTIONS {:?}, using default", val)),
            }
        }

        if let Some(val) = lookup("BCRYPT_COST") {
            match val.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => config.bcrypt_cost = cost,
                _ => warnings.push(format!("Invalid BCRYPT_COST {:?}, using default", val)),
            }
        }

        if let Some(dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        (config, warnings)
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.grpc_host, self.grpc_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_listen_on_9090() {
        let (config, warnings) = Config::from_lookup(|_| None);
        assert!(warnings.is_empty());
        assert_eq!(config.grpc_addr(), SocketAddr::from(([0, 0, 0, 0], 9090)));
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn reads_overrides() {
        let (config, warnings) = Config::from_lookup(lookup_from(&[
            ("GRPC_HOST", "127.0.0.1"),
            ("GRPC_PORT", "50051"),
            ("DATABASE_URL", "sqlite://other.db"),
            ("BCRYPT_COST", "4"),
        ]));
        assert_eq!(config.grpc_addr(), SocketAddr::from(([127, 0, 0, 1], 50051)));
        assert_eq!(config.database_url, "sqlite://other.db");
        assert_eq!(config.bcrypt_cost, 4);
        assert!(warnings.is_empty());
    }

    #[test]
    fn malformed_values_fall_back() {
        let (config, warnings) = Config::from_lookup(lookup_from(&[
            ("GRPC_PORT", "not-a-port"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("BCRYPT_COST", "99"),
        ]));
        assert_eq!(config.grpc_port, 9090);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);

        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("GRPC_PORT") && warnings[0].contains("not-a-port"));
        assert!(warnings[1].contains("DB_MAX_CONNECTIONS"));
        assert!(warnings[2].contains("BCRYPT_COST"));
    }
}
