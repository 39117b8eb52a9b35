//! Error classification
//!
//! Maps HTTP statuses, provider error bodies and transport failures onto
//! [`LlmError`] variants (and through them onto [`ErrorKind`](crate::error::ErrorKind)).
//! Classification is total: every input yields an error, nothing panics.

use crate::error::LlmError;

/// Keep diagnostic body samples short.
const BODY_SAMPLE_CHARS: usize = 200;

fn body_sample(body: &str) -> String {
    body.chars().take(BODY_SAMPLE_CHARS).collect()
}

fn quota_like(lower: &str) -> bool {
    lower.contains("quota")
        || lower.contains("insufficient_credits")
        || lower.contains("insufficient credits")
        || lower.contains("billing")
        || lower.contains("payment")
}

fn rate_like(lower: &str) -> bool {
    lower.contains("rate limit")
        || lower.contains("ratelimit")
        || lower.contains("rate_limit")
        || lower.contains("resource_exhausted")
        || lower.contains("too many requests")
}

fn model_missing_like(lower: &str) -> bool {
    lower.contains("model_not_found")
        || lower.contains("model not found")
        || lower.contains("no such model")
        || (lower.contains("model") && lower.contains("does not exist"))
}

/// Classify a non-success HTTP response.
///
/// Bodies are only consulted to refine ambiguous statuses (400/401/403); the
/// status table decides everything else.
pub fn classify_http_error(provider_id: &str, status: u16, body_text: &str) -> LlmError {
    let lower = body_text.to_lowercase();
    let sample = body_sample(body_text);

    let error = match status {
        401 if lower.contains("api key required") => LlmError::ApiKeyMissing(format!(
            "provider={provider_id} http=401 body_sample={sample}"
        )),
        401 => LlmError::AuthenticationError(format!(
            "provider={provider_id} unauthorized body_sample={sample}"
        )),
        402 => LlmError::PaymentRequired(format!(
            "provider={provider_id} http=402 body_sample={sample}"
        )),
        404 => LlmError::ModelNotFound(format!(
            "provider={provider_id} http=404 body_sample={sample}"
        )),
        429 => LlmError::RateLimitError(format!(
            "provider={provider_id} http=429 body_sample={sample}"
        )),
        400 if lower.contains("provider not found") => {
            LlmError::ProviderNotFound(format!("provider={provider_id} http=400"))
        }
        400 | 403 if quota_like(&lower) => {
            LlmError::PaymentRequired(format!("provider={provider_id} quota exceeded"))
        }
        400 | 403 if rate_like(&lower) => {
            LlmError::RateLimitError(format!("provider={provider_id} rate limited"))
        }
        400 if model_missing_like(&lower) => LlmError::ModelNotFound(format!(
            "provider={provider_id} http=400 body_sample={sample}"
        )),
        403 => LlmError::AuthenticationError(format!(
            "provider={provider_id} forbidden body_sample={sample}"
        )),
        _ => LlmError::api_error(
            status,
            if body_text.trim().is_empty() {
                format!("provider={provider_id} http={status}")
            } else {
                format!("provider={provider_id} http={status} body_sample={sample}")
            },
        ),
    };

    tracing::warn!(
        target: "chat_relay::http",
        provider = %provider_id,
        status,
        kind = ?error.kind(),
        "upstream returned an error status"
    );
    error
}

/// Classify a failure that happened before or while reading a response.
pub fn classify_transport_error(provider_id: &str, err: reqwest::Error) -> LlmError {
    // reqwest errors can embed the full URL, which may hold a query-string key.
    let err = err.without_url();
    let detail = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "response body interrupted"
    } else if err.is_request() {
        "request could not be sent"
    } else {
        "transport error"
    };
    tracing::warn!(
        target: "chat_relay::http",
        provider = %provider_id,
        error = %err,
        "{detail}"
    );
    LlmError::HttpError(format!("provider={provider_id} {detail}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn status_table_is_deterministic() {
        let table = [
            (401, ErrorKind::AuthError),
            (402, ErrorKind::PaymentRequired),
            (404, ErrorKind::ModelNotFound),
            (429, ErrorKind::RateLimited),
            (500, ErrorKind::UpstreamServerError),
            (503, ErrorKind::UpstreamServerError),
        ];
        for (status, kind) in table {
            for body in ["", "{\"error\":{\"message\":\"whatever\"}}", "<html>oops</html>"] {
                assert_eq!(
                    classify_http_error("openai", status, body).kind(),
                    kind,
                    "status {status} body {body}"
                );
            }
        }
    }

    #[test]
    fn unmapped_status_keeps_code_in_message() {
        let err = classify_http_error("openai", 418, "short and stout");
        assert_eq!(err.kind(), ErrorKind::UpstreamServerError);
        assert_eq!(err.user_message(), "Provider service error (HTTP 418)");
    }

    #[test]
    fn bodies_refine_ambiguous_statuses() {
        let cases = [
            (401, r#"{"error":"API key required"}"#, ErrorKind::ApiKeyMissing),
            (400, r#"{"error":"Provider not found"}"#, ErrorKind::ProviderNotFound),
            (
                403,
                r#"{"error":{"message":"You exceeded your current quota"}}"#,
                ErrorKind::PaymentRequired,
            ),
            (
                400,
                r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#,
                ErrorKind::RateLimited,
            ),
            (
                400,
                r#"{"error":{"code":"model_not_found"}}"#,
                ErrorKind::ModelNotFound,
            ),
            (403, "Forbidden", ErrorKind::AuthError),
            (400, "bad request", ErrorKind::UpstreamServerError),
        ];
        for (status, body, kind) in cases {
            assert_eq!(classify_http_error("x", status, body).kind(), kind, "{body}");
        }
    }

    #[test]
    fn body_sample_is_bounded() {
        let body = "x".repeat(10_000);
        match classify_http_error("openai", 500, &body) {
            LlmError::ApiError { code, message } => {
                assert_eq!(code, 500);
                assert!(message.len() < 300);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
