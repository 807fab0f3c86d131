//! Dispatch outcomes.

use crate::event::Event;
use serde::{Deserialize, Serialize};

/// HTTP-style code signalling a delivered event.
pub const SUCCESS_CODE: u16 = 200;

/// Code used for outcomes produced locally, without reaching a destination.
pub const LOCAL_FAILURE_CODE: u16 = 0;

/// The settled outcome of dispatching one event.
///
/// `code` is `200` on success, the destination's status code on a
/// destination-reported failure, and `0` when the pipeline itself produced
/// the outcome (opt-out, plugin failure, dropped event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub event: Event,
    pub code: u16,
    pub message: String,
}

impl DispatchResult {
    pub fn new(event: Event, code: u16, message: impl Into<String>) -> Self {
        Self {
            event,
            code,
            message: message.into(),
        }
    }

    pub fn success(event: Event) -> Self {
        Self::new(event, SUCCESS_CODE, Status::Success.as_str())
    }

    /// Outcome produced by the pipeline without reaching a destination.
    pub fn local_failure(event: Event, message: impl Into<String>) -> Self {
        Self::new(event, LOCAL_FAILURE_CODE, message)
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// Canonical status strings destinations report in [`DispatchResult::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Unknown,
    Skipped,
    Success,
    RateLimit,
    PayloadTooLarge,
    Invalid,
    Failed,
    Timeout,
    SystemError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Skipped => "skipped",
            Status::Success => "success",
            Status::RateLimit => "rate_limit",
            Status::PayloadTooLarge => "payload_too_large",
            Status::Invalid => "invalid",
            Status::Failed => "failed",
            Status::Timeout => "timeout",
            Status::SystemError => "system_error",
        }
    }

    /// Maps an HTTP response code onto a status.
    pub fn from_http_code(code: u16) -> Self {
        match code {
            200..=299 => Status::Success,
            429 => Status::RateLimit,
            413 => Status::PayloadTooLarge,
            408 => Status::Timeout,
            400..=499 => Status::Invalid,
            500..=599 => Status::Failed,
            _ => Status::Unknown,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let result = DispatchResult::success(Event::new("sample"));
        assert!(result.is_success());
        assert_eq!(result.message, "success");
    }

    #[test]
    fn test_local_failure_uses_zero_code() {
        let result = DispatchResult::local_failure(Event::new("sample"), "boom");
        assert_eq!(result.code, 0);
        assert!(!result.is_success());
    }

    #[test]
    fn test_status_from_http_code() {
        assert_eq!(Status::from_http_code(200), Status::Success);
        assert_eq!(Status::from_http_code(204), Status::Success);
        assert_eq!(Status::from_http_code(400), Status::Invalid);
        assert_eq!(Status::from_http_code(408), Status::Timeout);
        assert_eq!(Status::from_http_code(413), Status::PayloadTooLarge);
        assert_eq!(Status::from_http_code(429), Status::RateLimit);
        assert_eq!(Status::from_http_code(503), Status::Failed);
        assert_eq!(Status::from_http_code(0), Status::Unknown);
    }
}
