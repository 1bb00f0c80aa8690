//! Engine-level failures, mapped one-to-one onto the ABI status codes.

use thiserror::Error;

use crate::status;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    OutOfMemory(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Domain(String),
    #[error("{0}")]
    Length(String),
    #[error("{0}")]
    Overflow(String),
    #[error("timeout expired")]
    Timeout,
    #[error("{0}")]
    Logic(String),
    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// ABI status code reported for this failure.
    pub fn code(&self) -> i32 {
        match self {
            Self::OutOfMemory(_) => status::PPL_ERROR_OUT_OF_MEMORY,
            Self::InvalidArgument(_) => status::PPL_ERROR_INVALID_ARGUMENT,
            Self::Domain(_) => status::PPL_ERROR_DOMAIN_ERROR,
            Self::Length(_) => status::PPL_ERROR_LENGTH_ERROR,
            Self::Overflow(_) => status::PPL_ARITHMETIC_OVERFLOW,
            Self::Timeout => status::PPL_TIMEOUT_EXCEPTION,
            Self::Logic(_) => status::PPL_ERROR_LOGIC_ERROR,
            Self::Internal(_) => status::PPL_ERROR_INTERNAL_ERROR,
        }
    }
}

pub type EResult<T> = Result<T, EngineError>;

/// Fails with `InvalidArgument` unless `got` fits inside a space of `dim`.
pub fn check_dimension(op: &str, dim: usize, got: usize) -> EResult<()> {
    if got > dim {
        return Err(EngineError::invalid(format!(
            "{op}: argument of dimension {got} exceeds space dimension {dim}"
        )));
    }
    Ok(())
}

/// Fails with `InvalidArgument` unless both spaces agree.
pub fn check_same_dimension(op: &str, x: usize, y: usize) -> EResult<()> {
    if x != y {
        return Err(EngineError::invalid(format!(
            "{op}: dimension mismatch ({x} vs {y})"
        )));
    }
    Ok(())
}

pub fn check_variable(op: &str, dim: usize, var: usize) -> EResult<()> {
    if var >= dim {
        return Err(EngineError::invalid(format!(
            "{op}: variable {var} out of space of dimension {dim}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_negative_and_distinct() {
        let errors = [
            EngineError::OutOfMemory(String::new()),
            EngineError::invalid(""),
            EngineError::Domain(String::new()),
            EngineError::Length(String::new()),
            EngineError::Overflow(String::new()),
            EngineError::Timeout,
            EngineError::Logic(String::new()),
            EngineError::Internal(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(EngineError::code).collect();
        assert!(codes.iter().all(|c| *c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn dimension_checks() {
        assert!(check_dimension("op", 3, 3).is_ok());
        assert!(check_dimension("op", 3, 4).is_err());
        assert!(check_variable("op", 3, 2).is_ok());
        assert!(check_variable("op", 3, 3).is_err());
        assert!(check_same_dimension("op", 1, 2).is_err());
    }
}
