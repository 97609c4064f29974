// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while declaring commands or constructing arguments.

use thiserror::Error;

/// Errors produced by [`Command`](crate::Command) configuration and argument
/// construction.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// A slot resolved to an empty name.
    #[error("parameter bound to field `{field}` has no name")]
    UnnamedParameter {
        /// Record field (or slot) the empty name came from.
        field: String,
    },

    /// A slot with the same name is already declared on the command.
    #[error("command `{command}` already declares parameter `{name}`")]
    DuplicateParameter {
        /// Command name.
        command: String,
        /// Conflicting slot name.
        name: String,
    },

    /// The input record is neither an object, an array, nor null.
    #[error("unsupported input record: expected an object, array or null, got {kind}")]
    UnsupportedInput {
        /// JSON kind of the rejected input.
        kind: &'static str,
    },

    /// The input record could not be serialized.
    #[error("failed to serialize input record: {0}")]
    Serialize(#[from] serde_json::Error),
}
