//! The profiling backend as seen by the workflow.
//!
//! [`Backend`] is the capability the controller depends on; [`HttpBackend`]
//! implements it over HTTP with `reqwest`. Every method returns a `'static`
//! future so the controller can spawn it on the tokio runtime.

use crate::{
    ApiErrorBody, ChartConfig, ChartSpec, ProfilerError, ProfilerResult, UploadCandidate,
    UploadResponse,
};

use reqwest::{
    Client, Response,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{pin::Pin, time::Duration};
use tracing::{debug, info};

/// Default backend location.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Fallback messages when an error reply carries no `detail`.
const UPLOAD_FALLBACK: &str = "An unknown error occurred.";
const SUGGEST_FALLBACK: &str = "Could not fetch suggestions.";
const CHART_FALLBACK: &str = "Chart generation failed.";

/// Type alias for a boxed, dynamically dispatched Future that returns a `ProfilerResult<T>`.
pub type BackendFuture<T> = Pin<Box<dyn Future<Output = ProfilerResult<T>> + Send + 'static>>;

/// The three operations offered by the profiling service.
pub trait Backend: Send + Sync + 'static {
    /// `POST /upload`: profile the candidate file.
    fn upload(&self, candidate: &UploadCandidate) -> BackendFuture<UploadResponse>;

    /// `GET /suggest`: chart suggestions for the last uploaded file.
    fn suggest(&self) -> BackendFuture<Vec<ChartConfig>>;

    /// `POST /generate-chart`: build the figure for one suggestion.
    fn generate_chart(&self, config: &ChartConfig) -> BackendFuture<ChartSpec>;
}

/// `reqwest` implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url`.
    ///
    /// Without a `timeout` requests wait indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ProfilerResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpBackend {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Backend for HttpBackend {
    fn upload(&self, candidate: &UploadCandidate) -> BackendFuture<UploadResponse> {
        let client = self.client.clone();
        let url = self.endpoint("/upload");
        let candidate = candidate.clone();

        Box::pin(async move {
            let bytes = tokio::fs::read(&candidate.path).await?;
            info!(
                "Uploading {} ({} bytes) to {url}",
                candidate.file_name(),
                bytes.len()
            );

            let form = Form::new()
                .part("file", Part::bytes(bytes).file_name(candidate.file_name()))
                .text(
                    "date_format",
                    candidate.date_format.clone().unwrap_or_default(),
                );

            let response = client.post(&url).multipart(form).send().await?;
            read_json(response, UPLOAD_FALLBACK).await
        })
    }

    fn suggest(&self) -> BackendFuture<Vec<ChartConfig>> {
        let client = self.client.clone();
        let url = self.endpoint("/suggest");

        Box::pin(async move {
            debug!("Fetching suggestions from {url}");
            let response = client.get(&url).send().await?;
            read_json(response, SUGGEST_FALLBACK).await
        })
    }

    fn generate_chart(&self, config: &ChartConfig) -> BackendFuture<ChartSpec> {
        let client = self.client.clone();
        let url = self.endpoint("/generate-chart");
        let config = config.clone();

        Box::pin(async move {
            debug!("Requesting chart '{}' ({})", config.title, config.chart_type);
            let response = client.post(&url).json(&config).send().await?;
            let body: Value = read_json(response, CHART_FALLBACK).await?;
            parse_chart_spec(body)
        })
    }
}

/// Decodes a successful reply as `T`, or turns a non-2xx reply into `ProfilerError::Api`.
async fn read_json<T: DeserializeOwned>(response: Response, fallback: &str) -> ProfilerResult<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let detail = serde_json::from_slice::<ApiErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| fallback.to_string());

        return Err(ProfilerError::Api {
            status: status.as_u16(),
            detail,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

/// The figure arrives as a JSON string that itself holds `{data, layout}`.
/// An embedded object is accepted as well.
pub fn parse_chart_spec(body: Value) -> ProfilerResult<ChartSpec> {
    match body {
        Value::String(encoded) => Ok(serde_json::from_str(&encoded)?),
        other => Ok(serde_json::from_value(other)?),
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//
