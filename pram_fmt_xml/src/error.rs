//! Loader error kinds and source-location annotation.

use std::path::Path;

use pram_core::ModelError;
use thiserror::Error;

/// The error type for model loading.
///
/// Messages are human-readable and, where a source position is known,
/// prefixed with `In file '<path>', At line <N>, `.
#[derive(Debug, Error)]
pub enum Error {
    /// A supplied input file cannot be used.
    #[error("{0}")]
    Io(String),
    /// The same canonical input path was supplied more than once, or a
    /// duplicate value where a unique set is required.
    #[error("{0}")]
    DuplicateArgument(String),
    /// Invalid input: unknown vocabulary, undefined references, arity or
    /// unit mismatches, missing required constructs.
    #[error("{0}")]
    Validation(String),
    /// A reference loop in gates, parameters or event tree branches.
    #[error("{0}")]
    Cycle(String),
    /// A wrong argument count for an expression constructor.
    #[error("{0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn validation_at(line: usize, msg: impl Into<String>) -> Error {
        Error::Validation(format!("At line {line}, {}", msg.into()))
    }

    /// Prefixes the message with the source file.
    pub(crate) fn in_file(self, file: &Path) -> Error {
        self.map_msg(|msg| format!("In file '{}', {msg}", file.display()))
    }

    fn map_msg(self, annotate: impl FnOnce(String) -> String) -> Error {
        match self {
            // Io errors already name their path.
            Error::Io(msg) => Error::Io(msg),
            Error::DuplicateArgument(msg) => Error::DuplicateArgument(annotate(msg)),
            Error::Validation(msg) => Error::Validation(annotate(msg)),
            Error::Cycle(msg) => Error::Cycle(annotate(msg)),
            Error::InvalidArgument(msg) => Error::InvalidArgument(annotate(msg)),
        }
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::DuplicateArgument(msg) => Error::DuplicateArgument(msg),
            ModelError::InvalidArgument(msg) => Error::InvalidArgument(msg),
            other => Error::Validation(other.to_string()),
        }
    }
}
