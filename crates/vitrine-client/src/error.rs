// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Shown when a mutating endpoint answers with something other than JSON.
pub const PARSE_NOTICE: &str = "the server response could not be read -- check the server logs";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("cannot reach {url} -- check that the server is running ({source})")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("empty response from {path}")]
    EmptyResponse { path: String },
    #[error("malformed response from {path}: {reason}")]
    Malformed { path: String, reason: String },
    #[error("{0}")]
    Server(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Text for the alert dialog. Server messages are shown verbatim.
    pub fn alert(&self) -> String {
        match self {
            Self::Server(message) => message.clone(),
            Self::EmptyResponse { .. } | Self::Malformed { .. } => PARSE_NOTICE.to_owned(),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
