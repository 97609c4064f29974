// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass-through processor that emits lines as strings.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::{ExecutionContext, OutputProcessor, ParsedObject, ProcessorError};

/// Emits every line as a `String`, or one combined `String` at the end.
///
/// In combine mode the accumulated text is kept per execution, so a single
/// instance can back concurrent executions.
#[derive(Debug, Default)]
pub struct LineProcessor {
    throw_on_stderr: bool,
    output_empty: bool,
    combine: bool,
    combined: Mutex<HashMap<Uuid, Vec<String>>>,
}

impl LineProcessor {
    /// Emit each non-empty line as it arrives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one string holding every line once the process ends.
    #[must_use]
    pub fn combined() -> Self {
        Self {
            combine: true,
            ..Self::default()
        }
    }

    /// Raise [`ProcessorError::StderrReceived`] for every non-empty stderr line.
    #[must_use]
    pub fn with_throw_on_stderr(mut self, throw: bool) -> Self {
        self.throw_on_stderr = throw;
        self
    }

    /// Also emit (or accumulate) empty lines.
    #[must_use]
    pub fn with_output_empty(mut self, output_empty: bool) -> Self {
        self.output_empty = output_empty;
        self
    }

    /// Returns `true` if lines are combined into one string.
    pub fn is_combined(&self) -> bool {
        self.combine
    }

    fn add(&self, ctx: &ExecutionContext, line: &str) -> Vec<ParsedObject> {
        if !self.output_empty && line.is_empty() {
            return Vec::new();
        }
        if self.combine {
            self.combined
                .lock()
                .expect("combine lock poisoned")
                .entry(ctx.id())
                .or_default()
                .push(line.to_string());
            return Vec::new();
        }
        vec![ParsedObject::new(line.to_string())]
    }
}

impl OutputProcessor for LineProcessor {
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        Ok(self.add(ctx, line))
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
        Ok(self.add(ctx, line))
    }

    fn pre_started(&self, ctx: &ExecutionContext) {
        self.combined
            .lock()
            .expect("combine lock poisoned")
            .remove(&ctx.id());
    }

    fn ended(&self, ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        if !self.combine {
            return Ok(Vec::new());
        }
        let lines = self
            .combined
            .lock()
            .expect("combine lock poisoned")
            .remove(&ctx.id())
            .unwrap_or_default();
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ParsedObject::new(lines.join("\n"))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(objects: Vec<ParsedObject>) -> Vec<String> {
        objects
            .into_iter()
            .map(|o| o.downcast::<String>().unwrap())
            .collect()
    }

    #[test]
    fn passes_non_empty_lines_through() {
        let p = LineProcessor::new();
        let ctx = ExecutionContext::new("prog", "");
        assert_eq!(strings(p.parse_output(&ctx, "hello").unwrap()), ["hello"]);
        assert!(p.parse_output(&ctx, "").unwrap().is_empty());
        assert_eq!(strings(p.parse_error(&ctx, "oops").unwrap()), ["oops"]);
    }

    #[test]
    fn output_empty_keeps_blank_lines() {
        let p = LineProcessor::new().with_output_empty(true);
        let ctx = ExecutionContext::new("prog", "");
        assert_eq!(strings(p.parse_output(&ctx, "").unwrap()), [""]);
    }

    #[test]
    fn combine_emits_once_at_end() {
        let p = LineProcessor::combined();
        let ctx = ExecutionContext::new("prog", "");
        p.pre_started(&ctx);
        assert!(p.parse_output(&ctx, "a").unwrap().is_empty());
        assert!(p.parse_output(&ctx, "b").unwrap().is_empty());
        assert_eq!(strings(p.ended(&ctx).unwrap()), ["a\nb"]);
        assert!(p.ended(&ctx).unwrap().is_empty(), "state is consumed");
    }

    #[test]
    fn combine_keeps_executions_apart() {
        let p = LineProcessor::combined();
        let first = ExecutionContext::new("prog", "");
        let second = ExecutionContext::new("prog", "");
        p.parse_output(&first, "one").unwrap();
        p.parse_output(&second, "two").unwrap();
        assert_eq!(strings(p.ended(&second).unwrap()), ["two"]);
        assert_eq!(strings(p.ended(&first).unwrap()), ["one"]);
    }

    #[test]
    fn throw_on_stderr_rejects_error_lines() {
        let p = LineProcessor::new().with_throw_on_stderr(true);
        let ctx = ExecutionContext::new("prog", "");
        let err = p.parse_error(&ctx, "bad").unwrap_err();
        assert!(matches!(err, ProcessorError::StderrReceived { ref line } if line == "bad"));
    }
}
