//! Error types for the component engine.
//!
//! A rejected `set` is not an error value; it is reported through
//! [`SetOptions::on_error`](crate::SetOptions).

use std::fmt;

/// Errors raised by class construction, method calls and advice registration.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseError {
    /// `before`/`after` named a method the instance does not have.
    UnknownMethodForAdvice {
        /// The missing method name.
        method: String,
    },

    /// `call` named a method the instance does not have.
    MethodNotFound {
        /// The missing method name.
        method: String,
    },

    /// User code (a method, handler, advice or initializer) failed.
    Failed {
        /// Description of the failure.
        message: String,
    },

    /// Listeners failed while an event was dispatched.
    HandlerFailures {
        /// The dispatched event.
        event: String,
        /// Every failure, in dispatch order.
        failures: Vec<BaseError>,
    },
}

impl BaseError {
    /// Shorthand for [`BaseError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        BaseError::Failed {
            message: message.into(),
        }
    }
}

impl fmt::Display for BaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseError::UnknownMethodForAdvice { method } => {
                write!(f, "Cannot advise unknown method: {}", method)
            }
            BaseError::MethodNotFound { method } => {
                write!(f, "Method not found: {}", method)
            }
            BaseError::Failed { message } => write!(f, "{}", message),
            BaseError::HandlerFailures { event, failures } => {
                write!(f, "{} listener(s) failed on '{}'", failures.len(), event)?;
                for failure in failures {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BaseError {}

/// Result type alias for engine operations.
pub type BaseResult<T> = Result<T, BaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BaseError::UnknownMethodForAdvice {
            method: "zzz".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot advise unknown method: zzz");

        let err = BaseError::HandlerFailures {
            event: "show".to_string(),
            failures: vec![BaseError::failed("boom")],
        };
        assert_eq!(err.to_string(), "1 listener(s) failed on 'show'; boom");
    }
}
