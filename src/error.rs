use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every failure kind a package check can end with. All of these are
/// terminal for the current check: no retries, no partial success.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Unsupported repository type '{0}': only git-hosted packages can be verified.")]
    UnsupportedRepository(String),

    #[error("No tag among {tag_count} listed tags contains version '{version}'.")]
    TagNotFound { version: String, tag_count: usize },

    #[error("Download error: {0}")]
    Download(String),

    #[error("Tarball integrity mismatch: expected {expected}, computed {computed}.")]
    Checksum { expected: String, computed: String },

    #[error("Command '{command}' failed ({status}):\n{output}")]
    Subprocess {
        command: String,
        status: String,
        output: String,
    },

    #[error("Command '{command}' exceeded its {limit:?} deadline.")]
    Timeout { command: String, limit: Duration },

    #[error("Could not read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] json::JsonError),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}
