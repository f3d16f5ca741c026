use std::fmt::{Debug, Display};

use thiserror::Error as ThisError;

pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
}

pub enum ErrorKind {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Template(minijinja::Error),
    Validation(ValidationError),
    DocumentNotFound(i64),
    FantocciniNewSession(fantoccini::error::NewSessionError),
    FantocciniCmdError(fantoccini::error::CmdError),
    FantocciniPrintError(fantoccini::error::PrintConfigurationError),
    Other(String),
}

/// Input rejected by one of the pure calculation functions.
///
/// These never indicate a transient failure. The caller passed a value that has no business
/// meaning (a negative quantity, a fractional amount where a whole one is required) and must
/// sanitize it before trying again.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: String },

    #[error("amount in words needs a whole number of rupees, got {0}")]
    NotWhole(String),

    #[error("amount {0} is too large to express in words")]
    OutOfRange(String),

    #[error("line item id '{0}' appears more than once")]
    DuplicateLineId(String),

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

pub trait AddContext<T> {
    fn add_context(self, ctx: &str) -> Result<T, Error>;
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut context = self.context.clone();
        context.reverse();
        let context = if context.is_empty() {
            String::from("no context")
        } else {
            context.join(" -> ")
        };
        write!(f, "{context}")
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::Io(value),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Json(value),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Csv(value),
        }
    }
}

impl From<minijinja::Error> for Error {
    fn from(value: minijinja::Error) -> Self {
        Error {
            context: vec![format!("{:#}", value)],
            kind: ErrorKind::Template(value),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Validation(value),
        }
    }
}

impl From<fantoccini::error::PrintConfigurationError> for Error {
    fn from(value: fantoccini::error::PrintConfigurationError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::FantocciniPrintError(value),
        }
    }
}

impl From<fantoccini::error::NewSessionError> for Error {
    fn from(value: fantoccini::error::NewSessionError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::FantocciniNewSession(value),
        }
    }
}

impl From<fantoccini::error::CmdError> for Error {
    fn from(value: fantoccini::error::CmdError) -> Self {
        Error {
            context: vec![format!("{:?}", value)],
            kind: ErrorKind::FantocciniCmdError(value),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error {
            context: vec![value.to_string()],
            kind: ErrorKind::Other(value),
        }
    }
}

impl Error {
    /// Error for an update or delete that names a document id the store does not hold.
    pub fn not_found(id: i64) -> Error {
        Error {
            context: vec![format!("document {id} not found")],
            kind: ErrorKind::DocumentNotFound(id),
        }
    }

    /// Add more context to the given error. This context will ultimately be displayed to the user
    /// and could be useful for correcting bad input or filing a help ticket.
    ///
    /// Generally a single layer of context should be added for every level that an error is
    /// surfaced. If the error is surfaced all the way to main and not handled there, then all the
    /// context will be displayed to the user in reverse order
    ///
    /// # Arguments
    /// * `context` - Any additional information that would be useful for the user to see if the
    /// error is surfaced to them
    pub fn add_context(self, context: &str) -> Error {
        let mut existing = self.context;
        existing.push(context.to_string());
        Self {
            context: existing,
            ..self
        }
    }

    /// Return what went wrong, without the context chain.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl<T> AddContext<T> for Result<T, Error> {
    fn add_context(self, ctx: &str) -> Result<T, Error> {
        match self {
            Ok(d) => Ok(d),
            Err(e) => Err(e.add_context(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_displayed_outermost_first() {
        let err: Result<(), Error> = Err(Error::from(String::from("disk full")));
        let err = err
            .add_context("writing documents.json")
            .add_context("saving document")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "saving document -> writing documents.json -> disk full"
        );
    }

    #[test]
    fn validation_errors_keep_their_kind() {
        let err = Error::from(ValidationError::NotWhole("12.5".to_string()));
        assert!(matches!(
            err.kind(),
            ErrorKind::Validation(ValidationError::NotWhole(_))
        ));
        assert!(err.to_string().contains("12.5"));
    }

    #[test]
    fn not_found_carries_the_id() {
        let err = Error::not_found(42);
        assert!(matches!(err.kind(), ErrorKind::DocumentNotFound(42)));
    }
}
