//! External analysis backend over HTTP.
//!
//! Posts the incident and recent telemetry to a configured endpoint and
//! expects `{"analysis": "..."}` back. Every request is timeout-bounded;
//! callers treat any error as a cue to fall back to the generic narrative.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Summarizer, SummarizerError};
use crate::store::{CounterSnapshot, Incident};

/// Summarizer backed by an external HTTP analysis service.
pub struct ExternalSummarizer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    incident: &'a Incident,
    telemetry: &'a [CounterSnapshot],
}

#[derive(Deserialize)]
struct AnalysisResponse {
    analysis: String,
}

impl ExternalSummarizer {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl Summarizer for ExternalSummarizer {
    async fn summarize(
        &self,
        incident: &Incident,
        telemetry: &[CounterSnapshot],
    ) -> Result<String, SummarizerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&AnalysisRequest {
                incident,
                telemetry,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizerError::Timeout
                } else {
                    SummarizerError::Backend(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(SummarizerError::Backend(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: AnalysisResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Backend(e.to_string()))?;

        Ok(parsed.analysis)
    }
}
