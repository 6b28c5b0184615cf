// THEORY:
// The remote advice client turns a positional difference between two poses into a short
// natural-language critique by asking a hosted generative-text model. The interesting
// part is not the prompt but the contract around the network call:
//
// 1.  **Fail Before Sending**: The API key is resolved once, when the client is built.
//     Without one the client cannot be constructed, so no request is ever attempted.
// 2.  **Typed Retry Decisions**: Every HTTP attempt is classified into an
//     `AttemptOutcome`. Only `RateLimited` (429) and `ServiceUnavailable` (503) are
//     retried, with exponential backoff (2s, 4s, 8s by default). Anything else non-2xx
//     is terminal. Exhausting the retries yields `AdviceError::Busy`.
// 3.  **Bounded**: The loop runs at most `max_retries + 1` times. Together with the
//     per-request timeout of the transport this bounds the whole call.
// 4.  **Graceful Extraction**: A 2xx response without the expected
//     `candidates[0].content.parts[0].text` shape still counts as a successful call and
//     yields a fixed fallback sentence. Only an unparsable body is an error.
// 5.  **Swappable Transport**: The HTTP layer sits behind `AdviceTransport`, so the
//     retry policy can be exercised without a network.

use crate::config::AdviceConfig;
use crate::core_modules::landmark::FrameLandmarks;
use crate::error::AdviceError;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Returned when the service answered but the answer held no usable text.
pub const ADVICE_UNAVAILABLE: &str = "Advice unavailable.";

/// Used when the doubled backoff no longer fits in a `Duration`.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(300);

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one JSON POST. Implementations must not retry on their own.
pub trait AdviceTransport: Send + Sync {
    fn post_json<'a>(&'a self, url: &'a str, body: &'a Value) -> BoxFuture<'a, Result<TransportResponse, AdviceError>>;
}

/// The production transport, backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, AdviceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdviceError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl AdviceTransport for ReqwestTransport {
    fn post_json<'a>(&'a self, url: &'a str, body: &'a Value) -> BoxFuture<'a, Result<TransportResponse, AdviceError>> {
        async move {
            // The URL carries the API key; keep it out of error messages.
            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(|e| AdviceError::Transport(e.without_url().to_string()))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| AdviceError::Transport(e.without_url().to_string()))?;
            Ok(TransportResponse { status, body })
        }
        .boxed()
    }
}

/// Classification of a single HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(String),
    RateLimited,
    ServiceUnavailable,
    Terminal { status: u16, body: String },
}

impl AttemptOutcome {
    pub fn from_response(response: TransportResponse) -> Self {
        match response.status {
            200..=299 => AttemptOutcome::Success(response.body),
            429 => AttemptOutcome::RateLimited,
            503 => AttemptOutcome::ServiceUnavailable,
            status => AttemptOutcome::Terminal {
                status,
                body: response.body,
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptOutcome::RateLimited | AttemptOutcome::ServiceUnavailable)
    }
}

/// Positional difference of one landmark, target minus reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandmarkDelta {
    pub id: usize,
    pub dx: f64,
    pub dy: f64,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Deltas for every index present in both frames, rounded to four decimals.
pub fn landmark_deltas(reference: &FrameLandmarks, target: &FrameLandmarks) -> Vec<LandmarkDelta> {
    let len = reference.len().max(target.len());
    (0..len)
        .filter_map(|id| {
            let (r, t) = (reference.get(id)?, target.get(id)?);
            Some(LandmarkDelta {
                id,
                dx: round4(t.x - r.x),
                dy: round4(t.y - r.y),
            })
        })
        .collect()
}

/// The instruction sent to the model, with the deltas embedded as JSON.
pub fn build_prompt(deltas: &[LandmarkDelta], language: &str) -> String {
    let data = serde_json::to_string(deltas).unwrap_or_else(|_| "[]".to_string());
    format!(
        "The following data is the per-landmark coordinate difference between a model motion and the motion \
         being evaluated (target minus model, normalized image coordinates, y grows downward).\n\
         Based on this data, give concise advice for improving the form in {language}, in one or two sentences.\n\
         Data: {data}\n"
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Pulls the first candidate's first text part out of a success body.
pub fn extract_advice(body: &str) -> Result<String, AdviceError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| AdviceError::MalformedResponse(e.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty());

    Ok(text.unwrap_or_else(|| ADVICE_UNAVAILABLE.to_string()))
}

/// Client for the hosted generative-text endpoint.
#[derive(Clone)]
pub struct RemoteAdviceClient {
    config: AdviceConfig,
    api_key: String,
    transport: Arc<dyn AdviceTransport>,
}

impl RemoteAdviceClient {
    /// Builds a client over `transport`. Fails if no API key is configured.
    pub fn new(config: AdviceConfig, transport: Arc<dyn AdviceTransport>) -> Result<Self, AdviceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdviceError::MissingApiKey)?;
        Ok(Self {
            config,
            api_key,
            transport,
        })
    }

    /// Builds a client over the default HTTP transport.
    pub fn from_config(config: AdviceConfig) -> Result<Self, AdviceError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Self::new(config, Arc::new(transport))
    }

    pub fn config(&self) -> &AdviceConfig {
        &self.config
    }

    /// Delay before retry number `retry` (0-based): `initial_backoff * 2^retry`,
    /// or `MAX_BACKOFF_DELAY` if that overflows.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.config
            .initial_backoff()
            .checked_mul(2u32.saturating_pow(retry))
            .unwrap_or(MAX_BACKOFF_DELAY)
    }

    /// Requests a short critique of `target` against `reference`.
    pub async fn fetch_advice(&self, reference: &FrameLandmarks, target: &FrameLandmarks) -> Result<String, AdviceError> {
        let deltas = landmark_deltas(reference, target);
        let prompt = build_prompt(&deltas, &self.config.language);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });
        let url = format!("{}?key={}", self.config.generate_url(), self.api_key);

        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;
        loop {
            let response = self.transport.post_json(&url, &body).await?;
            debug!(status = response.status, attempt = attempt + 1, "advice service responded");

            match AttemptOutcome::from_response(response) {
                AttemptOutcome::Success(body) => return extract_advice(&body),
                AttemptOutcome::Terminal { status, body } => return Err(AdviceError::Terminal { status, body }),
                outcome if attempt < max_retries => {
                    let delay = self.backoff_delay(attempt);
                    attempt += 1;
                    warn!(
                        ?outcome,
                        retry = attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "advice service busy, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => return Err(AdviceError::Busy { attempts: attempt + 1 }),
            }
        }
    }
}
