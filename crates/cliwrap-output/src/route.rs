// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pattern-route processor: the first matching pattern picks the child.

use regex::Regex;

use crate::{
    ExecutionContext, OutputProcessor, ParsedObject, ProcessorError, SharedProcessor, Stream,
};

/// Routes each line to the child of the first pattern that matches it.
///
/// Patterns are tested in registration order and are not anchored; use
/// `^...$` to require a whole-line match.
#[derive(Default)]
pub struct RouteProcessor {
    routes: Vec<(Regex, SharedProcessor)>,
    throw_on_stderr: bool,
    throw_on_no_match: bool,
}

impl RouteProcessor {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route from a pattern string.
    pub fn add_route(
        mut self,
        pattern: &str,
        child: SharedProcessor,
    ) -> Result<Self, ProcessorError> {
        self.routes.push((Regex::new(pattern)?, child));
        Ok(self)
    }

    /// Add a route from a compiled pattern.
    #[must_use]
    pub fn with_route(mut self, pattern: Regex, child: SharedProcessor) -> Self {
        self.routes.push((pattern, child));
        self
    }

    /// Raise [`ProcessorError::StderrReceived`] for every non-empty stderr line.
    #[must_use]
    pub fn with_throw_on_stderr(mut self, throw: bool) -> Self {
        self.throw_on_stderr = throw;
        self
    }

    /// Raise [`ProcessorError::NoMatch`] for non-empty lines no route matches.
    #[must_use]
    pub fn with_throw_on_no_match(mut self, throw: bool) -> Self {
        self.throw_on_no_match = throw;
        self
    }

    fn route(
        &self,
        ctx: &ExecutionContext,
        line: &str,
        stream: Stream,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        if line.is_empty() {
            return Ok(Vec::new());
        }
        match self.routes.iter().find(|(re, _)| re.is_match(line)) {
            Some((_, child)) => match stream {
                Stream::Stdout => child.parse_output(ctx, line),
                Stream::Stderr => child.parse_error(ctx, line),
            },
            None if self.throw_on_no_match => Err(ProcessorError::NoMatch {
                stream,
                text: line.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

impl OutputProcessor for RouteProcessor {
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        self.route(ctx, line, Stream::Stdout)
    }

    fn parse_error(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        if self.throw_on_stderr && !line.is_empty() {
            return Err(ProcessorError::StderrReceived {
                line: line.to_string(),
            });
        }
        self.route(ctx, line, Stream::Stderr)
    }

    fn pre_started(&self, ctx: &ExecutionContext) {
        for (_, child) in &self.routes {
            child.pre_started(ctx);
        }
    }

    fn started(&self, ctx: &ExecutionContext) {
        for (_, child) in &self.routes {
            child.started(ctx);
        }
    }

    fn ended(&self, ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        let mut out = Vec::new();
        for (_, child) in &self.routes {
            match child.ended(ctx) {
                Ok(objects) => out.extend(objects),
                Err(e) => return Err(e.with_objects(out)),
            }
        }
        Ok(out)
    }
}
