// THEORY:
// Only two parts of the engine can fail hard: loading configuration and talking to the
// remote advice service. Everything in `core_modules` absorbs irregular data (missing
// joints, short clips) into soft results, so the error types live here, next to the
// layers that actually raise them.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the remote advice client.
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("no API key configured for the advice service (set GEMINI_API_KEY or [advice].api_key)")]
    MissingApiKey,

    #[error("advice service still busy after {attempts} attempts")]
    Busy { attempts: u32 },

    #[error("advice service returned HTTP {status}: {body}")]
    Terminal { status: u16, body: String },

    #[error("request to advice service failed: {0}")]
    Transport(String),

    #[error("advice service returned a malformed body: {0}")]
    MalformedResponse(String),
}

/// Failures while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
