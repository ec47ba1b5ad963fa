use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// The page could not be turned into a project list.
///
/// Kept apart from "zero projects": a failure must never reach the
/// state store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("project table container not found (login wall or layout change?)")]
    ContainerMissing,
    #[error("project table container has no data-props attribute")]
    PropsMissing,
    #[error("data-props is not valid JSON: {0}")]
    MalformedProps(String),
    #[error("unexpected data-props shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("failed to read response body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode seen set: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telegram API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("telegram rejected message: {0}")]
    Rejected(String),
}

/// Anything that ends a cycle early. The controller turns these into
/// `CycleOutcome::Skipped`.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseFailure),
    #[error("state write error: {0}")]
    StateWrite(#[from] StoreError),
}
