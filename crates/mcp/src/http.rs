//! Shared upstream HTTP plumbing for the tool families.

use fathom_core::{HandlerError, HttpFailure};
use serde_json::Value;

/// Cap on upstream error bodies carried into envelopes.
const ERROR_BODY_LIMIT: usize = 2_000;

/// Send a prepared request and decode the body as JSON, mapping every
/// failure mode onto the handler taxonomy. Transport failures and 5xx are
/// unavailability, 4xx is a rejection carrying the upstream body.
pub async fn fetch_json(request: reqwest::RequestBuilder) -> Result<Value, HandlerError> {
    let response = request
        .send()
        .await
        .map_err(|e| HandlerError::from_http(HttpFailure::Transport(e.to_string())))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| HandlerError::from_http(HttpFailure::Transport(e.to_string())))?;

    if !status.is_success() {
        return Err(HandlerError::from_http(HttpFailure::Status {
            code: status.as_u16(),
            body: truncate(body),
        }));
    }

    serde_json::from_str(&body).map_err(|_| {
        HandlerError::Unavailable(format!(
            "upstream returned a non-JSON response ({} bytes)",
            body.len()
        ))
    })
}

fn truncate(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("... (truncated)");
    }
    body
}

/// Upstream client used by every HTTP tool family. No global request
/// timeout; the dispatcher's per-call deadline governs cancellation.
pub fn build_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_preserves_short_bodies() {
        assert_eq!(truncate("not found".to_string()), "not found");
    }

    #[test]
    fn test_truncate_caps_long_bodies() {
        let long = "x".repeat(10_000);
        let out = truncate(long);
        assert!(out.len() < 2_100);
        assert!(out.ends_with("... (truncated)"));
    }
}
