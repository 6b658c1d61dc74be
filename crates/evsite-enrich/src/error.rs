//! Failure taxonomy for provider lookups.
//!
//! Adapters surface their internal errors as [`AdapterError`] and normalize
//! them into [`FailureReason`] at the lookup boundary, so a failure reaches
//! the site record as data rather than propagating as an error.

use serde::Serialize;
use thiserror::Error;

/// Why a provider lookup produced no data. Carried in the site record so the
/// consumer can distinguish a timeout from a quota rejection from a schema
/// mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The request exceeded its deadline.
    Timeout,

    /// Non-2xx HTTP status outside the auth/quota family.
    Http { status: u16 },

    /// Auth or quota rejection (401/403/429). Rate-limit class: drives
    /// batch pacing backoff.
    Denied { status: u16 },

    /// Provider-level error or an empty/unusable response.
    Provider { message: String },

    /// Response body did not match the expected shape.
    Parse { context: String },
}

impl FailureReason {
    /// Whether this failure should cause batch pacing to back off.
    #[must_use]
    pub fn is_rate_limit_class(&self) -> bool {
        matches!(self, FailureReason::Denied { .. })
    }

    /// Short human-readable form used in logs and flat exports.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            FailureReason::Timeout => "timeout".to_string(),
            FailureReason::Http { status } => format!("http {status}"),
            FailureReason::Denied { status } => format!("denied ({status})"),
            FailureReason::Provider { message } => format!("provider: {message}"),
            FailureReason::Parse { context } => format!("parse error: {context}"),
        }
    }
}

/// Internal errors inside a provider adapter. Never escapes the adapter:
/// [`AdapterError::into_reason`] converts it to the data-level taxonomy.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("no usable data: {0}")]
    NoData(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

fn classify_status(status: u16) -> FailureReason {
    match status {
        401 | 403 | 429 => FailureReason::Denied { status },
        _ => FailureReason::Http { status },
    }
}

impl AdapterError {
    /// Collapses the adapter error into the caller-facing failure taxonomy.
    #[must_use]
    pub fn into_reason(self) -> FailureReason {
        match self {
            AdapterError::Http(e) => {
                if e.is_timeout() {
                    FailureReason::Timeout
                } else if let Some(status) = e.status() {
                    classify_status(status.as_u16())
                } else {
                    FailureReason::Provider {
                        message: e.to_string(),
                    }
                }
            }
            AdapterError::Status { status, .. } => classify_status(status),
            AdapterError::InvalidBaseUrl { url, reason } => FailureReason::Provider {
                message: format!("invalid base URL {url}: {reason}"),
            },
            AdapterError::NoData(message) => FailureReason::Provider { message },
            AdapterError::Deserialize { context, .. } => FailureReason::Parse { context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_split_into_denied_and_http() {
        let denied = AdapterError::Status {
            status: 429,
            url: "http://example.test".to_string(),
        };
        assert_eq!(denied.into_reason(), FailureReason::Denied { status: 429 });

        let server_error = AdapterError::Status {
            status: 502,
            url: "http://example.test".to_string(),
        };
        assert_eq!(
            server_error.into_reason(),
            FailureReason::Http { status: 502 }
        );
    }

    #[test]
    fn deserialize_errors_become_parse_failures() {
        let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err = AdapterError::Deserialize {
            context: "reverse(51.5,-0.1)".to_string(),
            source,
        };
        assert!(matches!(
            err.into_reason(),
            FailureReason::Parse { ref context } if context == "reverse(51.5,-0.1)"
        ));
    }

    #[test]
    fn only_denied_is_rate_limit_class() {
        assert!(FailureReason::Denied { status: 429 }.is_rate_limit_class());
        assert!(!FailureReason::Timeout.is_rate_limit_class());
        assert!(!FailureReason::Http { status: 500 }.is_rate_limit_class());
        assert!(!FailureReason::Parse {
            context: String::new()
        }
        .is_rate_limit_class());
    }
}
