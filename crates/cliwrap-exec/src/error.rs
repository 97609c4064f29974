// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error type for executions and executables.

use cliwrap_args::ArgsError;
use cliwrap_output::ProcessorError;
use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Errors raised while creating, running or consuming an [`Execution`](crate::Execution).
#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be spawned.
    #[error("failed to spawn `{program}`")]
    Spawn {
        /// Program that failed to launch.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The argument string could not be split into words.
    #[error("invalid argument string `{arguments}`: {reason}")]
    Arguments {
        /// The offending argument string.
        arguments: String,
        /// Why splitting failed.
        reason: String,
    },

    /// Writing to the process's standard input failed.
    #[error("failed to write to stdin")]
    Stdin(#[source] std::io::Error),

    /// The execution has no standard input to write to.
    #[error("stdin is not available: no processor attached, not started or disposed")]
    StdinUnavailable,

    /// A lifecycle operation was attempted in the wrong state.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A parse error surfaced by a consumption mode.
    #[error("parse error: {0}")]
    Parse(#[from] ProcessorError),

    /// No command is registered under the requested name.
    #[error("unknown command `{name}`")]
    UnknownCommand {
        /// Requested name.
        name: String,
    },

    /// No operation is registered under the requested identifier.
    #[error("unknown operation `{name}`")]
    UnknownOperation {
        /// Requested identifier.
        name: String,
    },

    /// Argument construction failed.
    #[error(transparent)]
    Args(#[from] ArgsError),

    /// The private runtime for blocking consumption could not be built.
    #[error("failed to build blocking runtime")]
    Runtime(#[source] std::io::Error),

    /// Blocking consumption was requested from inside an async runtime.
    #[error("blocking consumption cannot run inside an async runtime; use the async mode")]
    NestedRuntime,
}
