use std::fmt;
use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::theme::{Projection, Scale, SpatialType, Theme};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error(
        "file not found for stem {stem} ({theme}, format {file_format}); available files: [{}]",
        available.join(", ")
    )]
    FileNotFound {
        theme: Theme,
        file_format: String,
        stem: String,
        available: Vec<String>,
    },

    #[error("HTTP request failed for url ({url}): {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("failed to fetch units ({context}): {source}")]
    Batch {
        context: FetchContext,
        #[source]
        source: Box<Error>,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for HTTP status and connection failures, including ones wrapped
    /// with batch context.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Batch { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// HTTP status of the underlying transport failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::Batch { source, .. } => source.status(),
            _ => None,
        }
    }

    pub(crate) fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            what,
            key: key.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Request parameters attached to a failed unit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchContext {
    pub theme: Theme,
    pub filter: String,
    pub spatial_type: SpatialType,
    pub scale: Option<Scale>,
    pub projection: Projection,
    pub year: String,
}

impl fmt::Display for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "theme={}, filter={}, spatial_type={}, scale={}, projection={}, year={}",
            self.theme,
            self.filter,
            self.spatial_type,
            self.scale.map(|s| s.as_str()).unwrap_or("none"),
            self.projection,
            self.year
        )
    }
}

pub(crate) fn status_error(status: StatusCode, url: &str, body: &str) -> Error {
    let body = body.trim();
    let message = if status == StatusCode::NOT_FOUND {
        // The service answers 404 for years or units it does not publish.
        format!(
            "HTTP 404, resource not published by GISCO (check the dataset year, unit id and scale)\n{}",
            body
        )
    } else if status.is_server_error() {
        format!("HTTP {}, GISCO service error\n{}", status.as_u16(), body)
    } else {
        format!("HTTP {}\n{}", status.as_u16(), body)
    };

    Error::Transport {
        url: url.to_string(),
        status: Some(status.as_u16()),
        message: message.trim_end().to_string(),
    }
}

pub(crate) fn connection_error(url: &str, err: &reqwest::Error) -> Error {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("could not connect: {}", err)
    } else {
        err.to_string()
    };

    Error::Transport {
        url: url.to_string(),
        status: err.status().map(|s| s.as_u16()),
        message,
    }
}
