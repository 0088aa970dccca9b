use std::path::PathBuf;

use anyhow::{bail, Context};

const SNAPSHOT_FILE: &str = "trivia.json";

/// Runtime settings, read from the environment (`.env` is loaded in debug builds).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the in-memory store's JSON snapshot.
    pub data_dir: PathBuf,
    /// Seed the stock trivia data when the store starts empty.
    pub seed: bool,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("TRIVIA_PORT") {
            Some(v) => v.parse().with_context(|| format!("TRIVIA_PORT is not a port: {v}"))?,
            None => 8080,
        };
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v}"))?,
            None => 5,
        };
        let seed = lookup("TRIVIA_SEED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        Ok(Self {
            host: lookup("TRIVIA_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            data_dir: lookup("TRIVIA_DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data")),
            seed,
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            max_connections,
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            bail!("TRIVIA_PORT must be non-zero");
        }
        if cfg!(feature = "postgres-store") && self.database_url.is_none() {
            bail!("DATABASE_URL must be set for postgres-store");
        }
        Ok(())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}
