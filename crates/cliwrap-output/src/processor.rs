// SPDX-License-Identifier: MIT OR Apache-2.0
//! The output processor contract.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::{ParsedObject, ProcessorError};

/// Which standard stream a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// Identity of the execution a processor call belongs to.
///
/// A processor may back several executions at once; stateful processors
/// key their per-run state by [`id`](Self::id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    id: Uuid,
    program: String,
    arguments: String,
}

impl ExecutionContext {
    /// Create a context with a fresh identifier.
    pub fn new(program: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            program: program.into(),
            arguments: arguments.into(),
        }
    }

    /// Unique identifier of the execution.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Program path or name being executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Fully constructed argument string.
    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}

/// Converts program output lines into parsed objects.
///
/// stdout and stderr are delivered from independent tasks, so the two
/// `parse_*` methods may run concurrently for the same execution. Within a
/// single stream, calls arrive in line order.
pub trait OutputProcessor: Send + Sync {
    /// Parse one completed stdout line.
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError>;

    /// Parse one completed stderr line.
    fn parse_error(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError>;

    /// Called before the process is launched.
    fn pre_started(&self, _ctx: &ExecutionContext) {}

    /// Called once the process is running and its streams are being read.
    fn started(&self, _ctx: &ExecutionContext) {}

    /// Called after both streams are drained, before the exit is reported.
    ///
    /// Returns trailing objects flushed from buffered state.
    fn ended(&self, _ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        Ok(Vec::new())
    }
}

/// A processor shared between commands and executions.
pub type SharedProcessor = Arc<dyn OutputProcessor>;

impl<P: OutputProcessor + ?Sized> OutputProcessor for Arc<P> {
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        (**self).parse_output(ctx, line)
    }

    fn parse_error(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        (**self).parse_error(ctx, line)
    }

    fn pre_started(&self, ctx: &ExecutionContext) {
        (**self).pre_started(ctx)
    }

    fn started(&self, ctx: &ExecutionContext) {
        (**self).started(ctx)
    }

    fn ended(&self, ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        (**self).ended(ctx)
    }
}
