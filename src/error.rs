use crate::WorkflowPhase;

use std::{io, path::PathBuf};
use thiserror::Error;

/**
Result type to simplify function signatures.

This is a custom result type that uses our custom `ProfilerError` for the error type.

Functions can return `ProfilerResult<T>` and then use `?` to automatically propagate errors.
*/
pub type ProfilerResult<T> = Result<T, ProfilerError>;

/**
Custom error type for Profiler View.

This enum defines all the possible errors that can occur in the application.

The first group is the workflow taxonomy surfaced to the user through the notifier.
The second group wraps transport and decoding failures coming from the backend client.
*/
#[derive(Error, Debug)]
pub enum ProfilerError {
    // --- Workflow errors ---
    /// Submit was attempted without a selected file.
    #[error("Please select a file first.")]
    NoFileSelected,

    /// Submit was attempted while the workflow could not accept an upload
    /// (an upload is already in flight, or the dashboard is showing).
    #[error("An upload cannot start while the workflow is {phase}.")]
    UploadRejected { phase: WorkflowPhase },

    /// The backend rejected the upload, or the request never completed.
    #[error("{0}")]
    UploadFailed(String),

    /// Non-fatal: the dashboard stays usable without suggestions.
    #[error("Could not fetch suggestions.")]
    SuggestFetchFailed,

    /// Scoped to the current chart session only.
    #[error("{0}")]
    ChartGenerationFailed(String),

    /// A response arrived for a request that is no longer the latest one.
    #[error("Response superseded by a newer request")]
    SupersededResponse,

    // --- Backend errors ---
    /// Non-2xx reply from the backend. `detail` is the server supplied message.
    #[error("Backend error {status}: {detail}")]
    Api { status: u16, detail: String },

    // Wrapper for reqwest errors (connection refused, timeouts, bad bodies).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Wrapper for serde_json errors (unexpected payload shapes).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Wrapper for standard IO errors (reading the file to upload).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Indicates that a specified file could not be found, storing the attempted path.
    #[error("File not found: {0:#?}")]
    FileNotFound(PathBuf),

    #[error("Invalid value for command-line argument '{arg_name}': {reason}")]
    InvalidArgument {
        arg_name: String, // Context about *which* argument failed
        reason: String,   // The specific error reason
    },

    // A catch-all for other, less specific errors not covered by specific variants.
    #[error("Other error: {0}")]
    Other(String),
}

impl ProfilerError {
    /// Text shown to the user for this error.
    ///
    /// Backend replies keep only their `detail`, transport timeouts read
    /// `"Request timed out"`, everything else uses `Display`.
    pub fn detail(&self) -> String {
        match self {
            ProfilerError::Api { detail, .. } => detail.clone(),
            ProfilerError::Http(err) if err.is_timeout() => "Request timed out".to_string(),
            other => other.to_string(),
        }
    }
}

// Implementation of the From trait to convert a String into a ProfilerError.
impl From<String> for ProfilerError {
    fn from(err: String) -> ProfilerError {
        ProfilerError::Other(err)
    }
}
