use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_raw =
            env::var("HORARIOS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_normalized = bind_raw
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .to_string();
        let bind_addr = bind_normalized
            .parse::<SocketAddr>()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let db_path = PathBuf::from(
            env::var("HORARIOS_DB_PATH").unwrap_or_else(|_| "horarios.db".to_string()),
        );

        Ok(Self { bind_addr, db_path })
    }
}
