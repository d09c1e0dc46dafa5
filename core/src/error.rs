//! Error types for the appliance client.
//!
//! # Design
//! `Connect` gets a dedicated variant because it is the one failure an
//! interactive caller is expected to treat as fatal: the appliance could not
//! be reached at all. A reply whose JSON `status` is not `"200"` is not an
//! error; it comes back as `Outcome::Fail` alongside the raw payload.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `ApplianceClient` and its building blocks.
#[derive(Debug, Error)]
pub enum ApiError {
    /// DNS lookup, connection refusal or another socket-level failure.
    #[error("cannot connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The connection was established but the exchange failed (TLS, protocol, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body is not a JSON document.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// A local file meant for upload could not be read.
    #[error("cannot read upload {}: {source}", .path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parameter needed to derive a name was not supplied.
    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    /// The tool name is neither `fio` nor `vdbench`.
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
}

impl ApiError {
    /// True when the appliance could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, ApiError::Connect { .. })
    }
}
