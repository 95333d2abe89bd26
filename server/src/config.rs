//! Server configuration, read from the environment

use crate::command::ReplyFormat;
use crate::store::{JsonlRowStore, MemoryRowStore, RowStore};
use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use labsense_shared::{codec::MAX_BODY_SIZE, schema, ResolverOptions};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Which row store backs the service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Jsonl(PathBuf),
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "memory" {
            return Ok(StoreBackend::Memory);
        }
        match s.strip_prefix("jsonl:") {
            Some(path) if !path.trim().is_empty() => Ok(StoreBackend::Jsonl(PathBuf::from(path.trim()))),
            _ => Err(anyhow!("invalid LABSENSE_STORE value: {}", s)),
        }
    }
}

/// Configuration for the webhook server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Row store backend
    pub store: StoreBackend,
    /// Offset used when showing the reading timestamp
    pub utc_offset_secs: i32,
    /// Command reply rendering
    pub reply_format: ReplyFormat,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            store: StoreBackend::Memory,
            utc_offset_secs: schema::DEFAULT_UTC_OFFSET_SECS,
            reply_format: ReplyFormat::Plain,
            max_body_bytes: MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Build from `LABSENSE_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store = match lookup("LABSENSE_STORE") {
            Some(raw) => raw.parse::<StoreBackend>()?,
            None => defaults.store,
        };
        let reply_format = match lookup("LABSENSE_REPLY_FORMAT") {
            Some(raw) => raw.parse::<ReplyFormat>().map_err(|e| anyhow!(e))?,
            None => defaults.reply_format,
        };

        let utc_offset_secs = parse_or(&lookup, "LABSENSE_UTC_OFFSET_SECS", defaults.utc_offset_secs)?;
        if FixedOffset::east_opt(utc_offset_secs).is_none() {
            return Err(anyhow!(
                "LABSENSE_UTC_OFFSET_SECS={} is outside ±86399 seconds",
                utc_offset_secs
            ));
        }

        Ok(Self {
            bind: lookup("LABSENSE_BIND").unwrap_or(defaults.bind),
            store,
            utc_offset_secs,
            reply_format,
            max_body_bytes: parse_or(&lookup, "LABSENSE_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        })
    }

    /// Open the configured row store
    pub fn open_store(&self) -> Arc<dyn RowStore> {
        match &self.store {
            StoreBackend::Memory => Arc::new(MemoryRowStore::new()),
            StoreBackend::Jsonl(path) => Arc::new(JsonlRowStore::new(path.clone())),
        }
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            utc_offset_secs: self.utc_offset_secs,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {}={:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}
