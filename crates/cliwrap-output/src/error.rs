// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types raised while parsing program output.

use thiserror::Error;

use crate::object::ParsedObject;
use crate::processor::Stream;

/// Errors raised by an [`OutputProcessor`](crate::OutputProcessor) for a
/// single line (or, in continuous mode, a buffered run of lines).
///
/// These are per-line failures: the execution keeps reading after one is
/// raised. The type is `Clone` so the same error can reach every
/// subscriber and still be re-raised when a collection completes.
#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    /// A stderr line arrived on a processor configured to reject them.
    #[error("standard error received: {line}")]
    StderrReceived {
        /// The offending stderr line.
        line: String,
    },

    /// No configured pattern matched the text.
    #[error("no pattern matched {stream} text: {text}")]
    NoMatch {
        /// Stream the text arrived on.
        stream: Stream,
        /// The unmatched text.
        text: String,
    },

    /// A capture could not be converted into its target type.
    #[error("failed to convert capture into {target}: {reason}")]
    Conversion {
        /// Rust type name of the conversion target.
        target: &'static str,
        /// Why the conversion failed.
        reason: String,
    },

    /// A pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// `error` was raised after `objects` had already been produced for
    /// the same text. Consumers should deliver the objects, then report
    /// the error.
    #[error("{error}")]
    Partial {
        /// Objects produced before the failure, in order.
        objects: Vec<ParsedObject>,
        /// The failure itself. Never another `Partial`.
        error: Box<ProcessorError>,
    },
}

impl ProcessorError {
    pub(crate) fn conversion<T: ?Sized>(reason: impl std::fmt::Display) -> Self {
        Self::Conversion {
            target: std::any::type_name::<T>(),
            reason: reason.to_string(),
        }
    }

    /// Attach objects produced before this error. Objects already carried
    /// by `self` follow the new ones.
    pub fn with_objects(self, mut objects: Vec<ParsedObject>) -> Self {
        if objects.is_empty() {
            return self;
        }
        let error = match self {
            Self::Partial {
                objects: later,
                error,
            } => {
                objects.extend(later);
                error
            }
            other => Box::new(other),
        };
        Self::Partial { objects, error }
    }

    /// Split into the objects produced before the failure and the
    /// underlying error.
    pub fn into_parts(self) -> (Vec<ParsedObject>, ProcessorError) {
        match self {
            Self::Partial { objects, error } => (objects, *error),
            other => (Vec::new(), other),
        }
    }
}
