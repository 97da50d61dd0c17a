use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Generate, GenerateError};
use crate::judge::JudgeConfig;

/// Blocking client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
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
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &JudgeConfig, api_key: String) -> Result<Self, GenerateError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            http,
            url: endpoint_url(&config.base_url, &config.model),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Generate for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e.without_url()));
            return Err(GenerateError::from_description(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        let parsed: GenerateResponse = response.json()?;
        extract_text(parsed)
    }
}

fn endpoint_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn extract_text(response: GenerateResponse) -> Result<String, GenerateError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();
    if text.is_empty() {
        return Err(GenerateError::other("empty response from model"));
    }
    Ok(text)
}
