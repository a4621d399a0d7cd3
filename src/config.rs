use std::{net::SocketAddr, str::FromStr};

use anyhow::Context;

/// Who assigns the surrogate `id` of new records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyPolicy {
    /// The request body carries the id on create and replace; a replace may re-key the record.
    #[default]
    Client,
    /// The database assigns ids; bodies may only repeat the id already in the path.
    Server,
}

impl FromStr for KeyPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(KeyPolicy::Client),
            "server" => Ok(KeyPolicy::Server),
            other => anyhow::bail!("unknown key policy {other:?}, expected \"client\" or \"server\""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub key_policy: KeyPolicy,
    pub enforce_references: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite://movies.db?mode=rwc".to_string());

        let db_max_connections: u32 = match var("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().context("DB_MAX_CONNECTIONS")?,
            None => 5,
        };
        if db_max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let key_policy = match var("KEY_POLICY") {
            Some(raw) => raw.parse().context("KEY_POLICY")?,
            None => KeyPolicy::default(),
        };

        let enforce_references = match var("ENFORCE_REFERENCES") {
            Some(raw) => parse_flag(&raw).context("ENFORCE_REFERENCES")?,
            None => true,
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections,
            key_policy,
            enforce_references,
        })
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}
