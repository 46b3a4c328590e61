use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;

pub fn generate_content_endpoint(base_url: &str, model: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/models/{model}:generateContent")
}

/// Outcome of a single `generateContent` call that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateReply {
    Text(String),
    /// HTTP 429. Carries the provider's `retryDelay` hint when it parses.
    QuotaExceeded { retry_after: Option<Duration> },
}

pub fn request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

/// Sends one prompt. Any status other than 200 and 429, a transport failure
/// or a response without candidate text is returned as an error.
pub fn generate_content(
    client: &reqwest::blocking::Client,
    endpoint: &str,
    api_key: &str,
    prompt: &str,
) -> anyhow::Result<GenerateReply> {
    let response = client
        .post(endpoint)
        .header("x-goog-api-key", api_key)
        .json(&request_body(prompt))
        .send()
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    let raw = response.text().context("read Gemini response body")?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Ok(GenerateReply::QuotaExceeded {
            retry_after: parse_retry_delay(&raw),
        });
    }
    if status != StatusCode::OK {
        let message = parse_error_message(&raw).unwrap_or(raw);
        anyhow::bail!("Gemini API error ({status}): {message}");
    }

    let value: serde_json::Value = serde_json::from_str(&raw).context("parse Gemini response")?;
    extract_candidate_text(&value).map(GenerateReply::Text)
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

/// Reads `error.details[..].retryDelay` (e.g. `"17s"`), preferring the last
/// detail entry that carries one.
pub fn parse_retry_delay(raw_json: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let details = value.get("error")?.get("details")?.as_array()?;
    let delay = details
        .iter()
        .rev()
        .find_map(|detail| detail.get("retryDelay").and_then(|v| v.as_str()))?;

    let seconds = delay.trim().strip_suffix('s')?.trim().parse::<f64>().ok()?;
    // Negative, NaN, and out-of-range hints all fall back to the default delay.
    Duration::try_from_secs_f64(seconds).ok()
}

fn extract_candidate_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let parts = value
        .pointer("/candidates/0/content/parts")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `candidates[0].content.parts` in response"))?;

    let mut text = String::new();
    for part in parts {
        if let Some(part_text) = part.get("text").and_then(|v| v.as_str()) {
            text.push_str(part_text);
        }
    }
    Ok(text)
}
