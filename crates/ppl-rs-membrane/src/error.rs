//! Typed errors of the object model.

use std::ffi::c_int;

use ppl_rs_native::status::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PplError {
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("domain error: {0}")]
    Domain(String),
    #[error("length error: {0}")]
    Length(String),
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
    #[error("i/o error: {0}")]
    Io(String),
    /// Internal errors, unknown standard exceptions and unexpected errors.
    #[error("internal error ({code}): {message}")]
    Internal { code: c_int, message: String },
    /// The status returned by a call disagrees with the error report.
    #[error("protocol violation (status {code}): {message}")]
    Protocol { code: c_int, message: String },
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("logic error: {0}")]
    Logic(String),
}

pub type Result<T> = std::result::Result<T, PplError>;

impl PplError {
    /// The error for a negative `code` whose report carried `message`.
    #[must_use]
    pub fn from_status(code: c_int, message: String) -> Self {
        match code {
            PPL_ERROR_OUT_OF_MEMORY => Self::ResourceExhaustion(message),
            PPL_ERROR_INVALID_ARGUMENT => Self::InvalidArgument(message),
            PPL_ERROR_DOMAIN_ERROR => Self::Domain(message),
            PPL_ERROR_LENGTH_ERROR => Self::Length(message),
            PPL_ARITHMETIC_OVERFLOW => Self::ArithmeticOverflow(message),
            PPL_STDIO_ERROR => Self::Io(message),
            PPL_TIMEOUT_EXCEPTION => Self::Timeout(message),
            PPL_ERROR_LOGIC_ERROR => Self::Logic(message),
            _ => Self::Internal { code, message },
        }
    }

    /// Native status code this error stands for.
    #[must_use]
    pub fn code(&self) -> c_int {
        match self {
            Self::ResourceExhaustion(_) => PPL_ERROR_OUT_OF_MEMORY,
            Self::InvalidArgument(_) => PPL_ERROR_INVALID_ARGUMENT,
            Self::Domain(_) => PPL_ERROR_DOMAIN_ERROR,
            Self::Length(_) => PPL_ERROR_LENGTH_ERROR,
            Self::ArithmeticOverflow(_) => PPL_ARITHMETIC_OVERFLOW,
            Self::Io(_) => PPL_STDIO_ERROR,
            Self::Timeout(_) => PPL_TIMEOUT_EXCEPTION,
            Self::Logic(_) => PPL_ERROR_LOGIC_ERROR,
            Self::Internal { code, .. } | Self::Protocol { code, .. } => *code,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ResourceExhaustion(m)
            | Self::InvalidArgument(m)
            | Self::Domain(m)
            | Self::Length(m)
            | Self::ArithmeticOverflow(m)
            | Self::Io(m)
            | Self::Timeout(m)
            | Self::Logic(m) => m,
            Self::Internal { message, .. } | Self::Protocol { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in [
            PPL_ERROR_OUT_OF_MEMORY,
            PPL_ERROR_INVALID_ARGUMENT,
            PPL_ERROR_DOMAIN_ERROR,
            PPL_ERROR_LENGTH_ERROR,
            PPL_ARITHMETIC_OVERFLOW,
            PPL_STDIO_ERROR,
            PPL_ERROR_INTERNAL_ERROR,
            PPL_ERROR_UNKNOWN_STANDARD_EXCEPTION,
            PPL_ERROR_UNEXPECTED_ERROR,
            PPL_TIMEOUT_EXCEPTION,
            PPL_ERROR_LOGIC_ERROR,
        ] {
            let err = PplError::from_status(code, "m".into());
            assert_eq!(err.code(), code);
            assert_eq!(err.message(), "m");
        }
    }

    #[test]
    fn unknown_codes_are_internal() {
        assert!(matches!(
            PplError::from_status(-9, String::new()),
            PplError::Internal { code: -9, .. }
        ));
        assert!(matches!(
            PplError::from_status(-77, String::new()),
            PplError::Internal { code: -77, .. }
        ));
    }
}
