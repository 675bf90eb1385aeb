use crate::errors::ServiceError;
use crate::models::{Day, Summary};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

pub const NOT_CONFIGURED_MESSAGE: &str = "AI report generation is not available. The API key is not configured for this deployment. Set GEMINI_API_KEY on the server to enable reports.";
pub const FAILED_MESSAGE: &str =
    "Could not generate the report due to an error. Please check the server logs for details.";

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, summary: &str) -> Result<String, ServiceError>;
}

/// The one fact sheet sent to the generator. `households` is every row loaded
/// for the day, participating or not.
pub fn summary_text(day: Day, summary: &Summary, households: usize) -> String {
    let label = day.sheet_name();
    format!(
        "{label} Progress: {} out of {} plates served.\nNumber of households participating on {label}: {households}.",
        summary.total_served, summary.total_subscribed
    )
}

pub fn build_prompt(summary: &str) -> String {
    format!(
        "You are an event management assistant for a cultural festival.\n\
         Based on the following data for bhog distribution, write a short, friendly and informative status report.\n\
         Keep the tone positive and encouraging, cover the overall progress and thank the volunteers.\n\n\
         Data:\n{summary}\n\n\
         Start the report with a festive greeting."
    )
}

pub fn report_or_fallback(outcome: Result<String, ServiceError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(ServiceError::Configuration(_)) => NOT_CONFIGURED_MESSAGE.to_string(),
        Err(err) => {
            error!("report generation failed: {err}");
            FAILED_MESSAGE.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn response_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|part| part.text).collect();
    Some(text).filter(|text| !text.trim().is_empty())
}

#[async_trait]
impl ReportGenerator for GeminiClient {
    async fn generate(&self, summary: &str) -> Result<String, ServiceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("report requested but no API key is configured");
            return Err(ServiceError::Configuration(NOT_CONFIGURED_MESSAGE.to_string()));
        };

        let prompt = build_prompt(summary);
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Remote(format!(
                "report service returned {status}: {}",
                body.trim()
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        response_text(parsed)
            .ok_or_else(|| ServiceError::Format("report service returned no text".to_string()))
    }
}
