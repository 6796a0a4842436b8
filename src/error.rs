/*!
 * Error Handling for the Key Blob Codec
 *
 * Two layers live here. `ErrorCode` is the compact, keymaster-numbered status
 * that a `KeyBlob` keeps as its sticky error. `CryptoError` is the richer
 * error returned from `Result`-based APIs, with diagnostics, user-facing
 * messages and suggested remediation.
 */

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Keymaster-style status codes
///
/// Values follow the keymaster numbering so that codes recorded on a blob can
/// be handed back across an HAL boundary unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ErrorCode {
    #[default]
    Ok = 0,
    UnsupportedAlgorithm = -4,
    UnsupportedKeySize = -6,
    InsufficientBufferSpace = -29,
    InvalidKeyBlob = -33,
    InvalidArgument = -38,
    InvalidTag = -40,
    MemoryAllocationFailed = -41,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }

    /// Look a code up from its numeric value
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Ok),
            -4 => Some(ErrorCode::UnsupportedAlgorithm),
            -6 => Some(ErrorCode::UnsupportedKeySize),
            -29 => Some(ErrorCode::InsufficientBufferSpace),
            -33 => Some(ErrorCode::InvalidKeyBlob),
            -38 => Some(ErrorCode::InvalidArgument),
            -40 => Some(ErrorCode::InvalidTag),
            -41 => Some(ErrorCode::MemoryAllocationFailed),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Ok => "OK",
            ErrorCode::UnsupportedAlgorithm => "UNSUPPORTED_ALGORITHM",
            ErrorCode::UnsupportedKeySize => "UNSUPPORTED_KEY_SIZE",
            ErrorCode::InsufficientBufferSpace => "INSUFFICIENT_BUFFER_SPACE",
            ErrorCode::InvalidKeyBlob => "INVALID_KEY_BLOB",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::InvalidTag => "INVALID_TAG",
            ErrorCode::MemoryAllocationFailed => "MEMORY_ALLOCATION_FAILED",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Comprehensive error type for key blob and authorization set operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key blob operation failed: {operation} - {cause}")]
    KeyBlobError {
        operation: String,
        cause: String,
        error_code: ErrorCode,
        context: HashMap<String, String>,
    },

    #[error("Authorization set error: {operation} - {cause}")]
    AuthorizationError {
        operation: String,
        cause: String,
        error_code: ErrorCode,
    },

    #[error("Memory operation failed: {operation} - {cause}")]
    MemoryError {
        operation: String,
        cause: String,
        error_code: ErrorCode,
    },

    #[error("Invalid parameter: {parameter} - {expected} - got {actual}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        actual: String,
        error_code: ErrorCode,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CryptoError {
    /// Get the status code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CryptoError::KeyBlobError { error_code, .. } => *error_code,
            CryptoError::AuthorizationError { error_code, .. } => *error_code,
            CryptoError::MemoryError { error_code, .. } => *error_code,
            CryptoError::InvalidParameter { error_code, .. } => *error_code,
            CryptoError::SerializationError(_) => ErrorCode::InvalidArgument,
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            CryptoError::KeyBlobError {
                operation,
                error_code,
                ..
            } => match error_code {
                ErrorCode::UnsupportedAlgorithm => format!(
                    "Key blob operation '{}' failed: the key does not declare a supported algorithm.",
                    operation
                ),
                ErrorCode::UnsupportedKeySize => format!(
                    "Key blob operation '{}' failed: the key does not declare a key size.",
                    operation
                ),
                _ => format!(
                    "Key blob operation '{}' failed. The stored key may be corrupted or truncated.",
                    operation
                ),
            },
            CryptoError::AuthorizationError { operation, .. } => {
                format!(
                    "Authorization set operation '{}' failed. Key policy cannot be read.",
                    operation
                )
            }
            CryptoError::MemoryError { operation, .. } => {
                format!(
                    "Memory operation '{}' failed. System may be low on memory.",
                    operation
                )
            }
            CryptoError::InvalidParameter {
                parameter,
                expected,
                ..
            } => {
                format!(
                    "Invalid parameter '{}'. Expected '{}' format.",
                    parameter, expected
                )
            }
            CryptoError::SerializationError(_) => {
                "Data serialization failed. Data format may be corrupted.".to_string()
            }
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            CryptoError::KeyBlobError {
                operation,
                cause,
                context,
                ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
                details.extend(context.clone());
            }
            CryptoError::AuthorizationError {
                operation, cause, ..
            }
            | CryptoError::MemoryError {
                operation, cause, ..
            } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            CryptoError::InvalidParameter {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            CryptoError::SerializationError(cause) => {
                details.insert("cause".to_string(), cause.clone());
            }
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self.error_code() {
            ErrorCode::InvalidKeyBlob => Some(
                "Check that the blob was produced by this key store and was not truncated in storage."
                    .to_string(),
            ),
            ErrorCode::UnsupportedAlgorithm => Some(
                "Regenerate the key with an ALGORITHM authorization in its key description."
                    .to_string(),
            ),
            ErrorCode::UnsupportedKeySize => Some(
                "Regenerate the key with a KEY_SIZE authorization in its key description."
                    .to_string(),
            ),
            ErrorCode::InsufficientBufferSpace => Some(
                "Allocate an output buffer of at least serialized_size() bytes.".to_string(),
            ),
            ErrorCode::MemoryAllocationFailed => Some(
                "Check available system memory. Consider reducing concurrent operations."
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            CryptoError::KeyBlobError { .. } => "KeyBlobError",
            CryptoError::AuthorizationError { .. } => "AuthorizationError",
            CryptoError::MemoryError { .. } => "MemoryError",
            CryptoError::InvalidParameter { .. } => "InvalidParameter",
            CryptoError::SerializationError { .. } => "SerializationError",
        }
    }
}

/// Convenience constructors for common error types
impl CryptoError {
    pub fn key_blob_error(operation: &str, cause: &str, error_code: ErrorCode) -> Self {
        CryptoError::KeyBlobError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
            context: HashMap::new(),
        }
    }

    pub fn authorization_error(operation: &str, cause: &str, error_code: ErrorCode) -> Self {
        CryptoError::AuthorizationError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn memory_error(operation: &str, cause: &str) -> Self {
        CryptoError::MemoryError {
            operation: operation.to_string(),
            cause: cause.to_string(),
            error_code: ErrorCode::MemoryAllocationFailed,
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: &str, actual: &str) -> Self {
        CryptoError::InvalidParameter {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: ErrorCode::InvalidArgument,
        }
    }

    /// Add a context entry to a key blob error; other variants are returned unchanged
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        if let CryptoError::KeyBlobError { context, .. } = &mut self {
            context.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl From<ErrorCode> for CryptoError {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::MemoryAllocationFailed => {
                CryptoError::memory_error("key_blob_parse", "buffer allocation failed")
            }
            ErrorCode::InvalidTag => CryptoError::authorization_error(
                "lookup",
                "tag is not valid for the requested value type",
                code,
            ),
            other => CryptoError::key_blob_error("deserialize", &other.to_string(), other),
        }
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(err: serde_json::Error) -> Self {
        CryptoError::SerializationError(err.to_string())
    }
}

/// Result type alias for codec operations
pub type CryptoResult<T> = Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Ok.code(), 0);
        assert_eq!(ErrorCode::InvalidKeyBlob.code(), -33);
        assert_eq!(ErrorCode::MemoryAllocationFailed.code(), -41);
        assert_eq!(ErrorCode::from_code(-6), Some(ErrorCode::UnsupportedKeySize));
        assert_eq!(ErrorCode::from_code(-1000), None);
        assert!(ErrorCode::default().is_ok());
    }

    #[test]
    fn test_error_code_from_sticky_status() {
        let error = CryptoError::from(ErrorCode::InvalidKeyBlob);
        assert_eq!(error.error_code(), ErrorCode::InvalidKeyBlob);
        assert_eq!(error.error_type(), "KeyBlobError");

        let error = CryptoError::from(ErrorCode::MemoryAllocationFailed);
        assert_eq!(error.error_type(), "MemoryError");
    }

    #[test]
    fn test_user_friendly_message() {
        let error = CryptoError::key_blob_error(
            "deserialize",
            "no ALGORITHM tag",
            ErrorCode::UnsupportedAlgorithm,
        );
        let message = error.user_friendly_message();
        assert!(message.contains("supported algorithm"));
    }

    #[test]
    fn test_technical_details() {
        let error = CryptoError::key_blob_error("deserialize", "truncated", ErrorCode::InvalidKeyBlob)
            .with_context("blob_length", "7");
        let details = error.technical_details();
        assert!(details.contains_key("error_code"));
        assert!(details.contains_key("timestamp"));
        assert_eq!(details.get("blob_length").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_remediation_suggestions() {
        let error = CryptoError::from(ErrorCode::UnsupportedKeySize);
        let suggestion = error.suggested_remediation();
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("KEY_SIZE"));

        let error = CryptoError::SerializationError("bad".to_string());
        assert!(error.suggested_remediation().is_none());
    }
}
