// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fan-out processor: every line goes to every child.

use crate::{ExecutionContext, OutputProcessor, ParsedObject, ProcessorError, SharedProcessor};

/// Delegates each call to an ordered list of children and concatenates
/// their results in child order.
#[derive(Default)]
pub struct FanOutProcessor {
    children: Vec<SharedProcessor>,
    throw_on_stderr: bool,
}

impl FanOutProcessor {
    /// Create a fan-out over `children`.
    #[must_use]
    pub fn new(children: Vec<SharedProcessor>) -> Self {
        Self {
            children,
            throw_on_stderr: false,
        }
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: SharedProcessor) -> Self {
        self.children.push(child);
        self
    }

    /// Raise [`ProcessorError::StderrReceived`] for every non-empty stderr
    /// line instead of delegating it.
    #[must_use]
    pub fn with_throw_on_stderr(mut self, throw: bool) -> Self {
        self.throw_on_stderr = throw;
        self
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn collect(
        &self,
        mut call: impl FnMut(&SharedProcessor) -> Result<Vec<ParsedObject>, ProcessorError>,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        let mut out = Vec::new();
        for child in &self.children {
            match call(child) {
                Ok(objects) => out.extend(objects),
                Err(e) => return Err(e.with_objects(out)),
            }
        }
        Ok(out)
    }
}

impl OutputProcessor for FanOutProcessor {
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        self.collect(|c| c.parse_output(ctx, line))
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
        self.collect(|c| c.parse_error(ctx, line))
    }

    fn pre_started(&self, ctx: &ExecutionContext) {
        for child in &self.children {
            child.pre_started(ctx);
        }
    }

    fn started(&self, ctx: &ExecutionContext) {
        for child in &self.children {
            child.started(ctx);
        }
    }

    fn ended(&self, ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        self.collect(|c| c.ended(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineProcessor;
    use std::sync::Arc;

    #[test]
    fn concatenates_children_in_order() {
        let children: Vec<SharedProcessor> = vec![
            Arc::new(LineProcessor::new()),
            Arc::new(LineProcessor::new()),
        ];
        let fan = FanOutProcessor::new(children);
        let ctx = ExecutionContext::new("prog", "");
        let out = fan.parse_output(&ctx, "x").unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| o.downcast_ref::<String>().unwrap() == "x"));
    }

    #[test]
    fn ended_collects_from_every_child() {
        let fan = FanOutProcessor::default()
            .with_child(Arc::new(LineProcessor::combined()))
            .with_child(Arc::new(LineProcessor::new()));
        let ctx = ExecutionContext::new("prog", "");
        fan.pre_started(&ctx);
        let live = fan.parse_output(&ctx, "line").unwrap();
        assert_eq!(live.len(), 1, "only the pass-through child emits live");
        let tail = fan.ended(&ctx).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].downcast_ref::<String>().unwrap(), "line");
    }

    #[test]
    fn earlier_children_output_survives_a_later_failure() {
        let fan = FanOutProcessor::default()
            .with_child(Arc::new(LineProcessor::new()))
            .with_child(Arc::new(LineProcessor::new().with_throw_on_stderr(true)));
        let ctx = ExecutionContext::new("prog", "");
        let err = fan.parse_error(&ctx, "boom").unwrap_err();
        let (objects, inner) = err.into_parts();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].downcast_ref::<String>().unwrap(), "boom");
        assert!(matches!(inner, ProcessorError::StderrReceived { .. }));
    }

    #[test]
    fn empty_stderr_line_is_not_escalated() {
        let fan = FanOutProcessor::default()
            .with_child(Arc::new(LineProcessor::new()))
            .with_throw_on_stderr(true);
        let ctx = ExecutionContext::new("prog", "");
        assert!(fan.parse_error(&ctx, "").unwrap().is_empty());
        assert!(fan.parse_error(&ctx, "boom").is_err());
    }
}
