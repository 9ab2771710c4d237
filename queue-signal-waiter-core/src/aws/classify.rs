//! Transient vs fatal classification of queue errors.
//!
//! Structured error codes are matched against a known list, and also against
//! the marker set older queue integrations relied on so that related codes
//! (`KmsAccessDenied`) stay fatal. Errors that arrive without a code fall back
//! to substring matching on the message.

use super::AwsError;

/// Error codes after which polling again cannot succeed.
pub const FATAL_ERROR_CODES: &[&str] = &[
    "AWS.SimpleQueueService.NonExistentQueue",
    "QueueDoesNotExist",
    "AccessDenied",
    "AccessDeniedException",
    "InvalidParameterValue",
    "InvalidAddress",
    "InvalidSecurity",
    "UnsupportedOperation",
    "KmsAccessDenied",
    "KmsDisabled",
    "KmsNotFound",
    "KmsInvalidState",
    "KmsInvalidKeyUsage",
    "KmsOptInRequired",
];

/// Minimum compatibility set, matched inside codes and inside the messages
/// of errors that carry no code.
pub const FATAL_MESSAGE_MARKERS: &[&str] = &[
    "NonExistentQueue",
    "QueueDoesNotExist",
    "AccessDenied",
    "InvalidParameterValue",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Back off and poll again.
    Transient,
    /// Abort the run.
    Fatal,
}

pub fn classify(err: &AwsError) -> ErrorClass {
    match err {
        AwsError::ConfigError(_) => ErrorClass::Fatal,
        AwsError::Service {
            code: Some(code), ..
        } => {
            if FATAL_ERROR_CODES.contains(&code.as_str()) {
                ErrorClass::Fatal
            } else {
                classify_text(code)
            }
        }
        AwsError::Service {
            code: None,
            message,
            ..
        } => classify_text(message),
        AwsError::Transport(message) => classify_text(message),
    }
}

fn classify_text(text: &str) -> ErrorClass {
    if FATAL_MESSAGE_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
    {
        ErrorClass::Fatal
    } else {
        ErrorClass::Transient
    }
}
