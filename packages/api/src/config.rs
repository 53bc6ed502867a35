use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use lignage_extractor::canon::{place_definitions_from_json, profession_definitions_from_json};
use lignage_extractor::config::DEFAULT_MAX_PAYLOAD_BYTES;
use lignage_extractor::{ExtractOptions, Result};
use serde_json::Value;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub max_payload_bytes: usize,
    pub places_file: Option<PathBuf>,
    pub professions_file: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            places_file: None,
            professions_file: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; invalid values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup("LIGNAGE_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|_| {
                tracing::warn!("LIGNAGE_BIND_ADDR is not a socket address, using {DEFAULT_BIND_ADDR}");
                defaults.bind_addr
            });

        let max_payload_bytes = match lookup("LIGNAGE_MAX_PAYLOAD_BYTES") {
            Some(value) => match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    tracing::warn!(value = %value, "LIGNAGE_MAX_PAYLOAD_BYTES is invalid, using the default");
                    defaults.max_payload_bytes
                }
            },
            None => defaults.max_payload_bytes,
        };

        let path = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        Self {
            bind_addr,
            max_payload_bytes,
            places_file: path("LIGNAGE_PLACES_FILE"),
            professions_file: path("LIGNAGE_PROFESSIONS_FILE"),
        }
    }

    /// Load the configured dictionaries into extraction options.
    ///
    /// A missing or unreadable dictionary file is an error; malformed entries
    /// inside a readable file are skipped.
    pub fn extract_options(&self) -> Result<ExtractOptions> {
        let places = match &self.places_file {
            Some(path) => Some(place_definitions_from_json(&read_json(path)?)),
            None => None,
        };
        let professions = match &self.professions_file {
            Some(path) => Some(profession_definitions_from_json(&read_json(path)?)),
            None => None,
        };

        if let Some(places) = &places {
            tracing::info!(count = places.len(), "Loaded custom place dictionary");
        }
        if let Some(professions) = &professions {
            tracing::info!(count = professions.len(), "Loaded custom profession dictionary");
        }

        Ok(ExtractOptions {
            places,
            professions,
            ..ExtractOptions::default()
        })
    }
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}
