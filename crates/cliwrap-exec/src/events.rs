// SPDX-License-Identifier: MIT OR Apache-2.0
//! Events published by an execution to its subscribers.

use std::sync::{Arc, Mutex};

use cliwrap_output::{ParsedObject, ProcessorError};
use serde::{Deserialize, Serialize};

/// How a process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Whether the process reported success.
    pub success: bool,
    /// Whether the process was killed through [`Execution::kill`](crate::Execution::kill).
    pub killed: bool,
}

/// A single event in an execution's life, in delivery order.
///
/// Line and object events from stdout and stderr interleave without a
/// defined order between the two streams; within one stream they are FIFO.
#[derive(Debug)]
pub enum ExecutionEvent<'a> {
    /// About to spawn the process.
    PreStarted,
    /// The process was spawned.
    Started {
        /// OS process id, when known.
        pid: Option<u32>,
    },
    /// A raw stdout line, before the processor sees it.
    StdoutLine(&'a str),
    /// A raw stderr line, before the processor sees it.
    StderrLine(&'a str),
    /// One object produced by the processor.
    Output(&'a ParsedObject),
    /// A processor call failed. Reading continues.
    Error(&'a ProcessorError),
    /// The process exited; trailing processor output follows as `Output`.
    PreExited,
    /// Everything has been delivered.
    Exited(&'a ExitInfo),
}

pub(crate) type Handler = Arc<dyn Fn(&ExecutionEvent<'_>) + Send + Sync>;

/// Subscriber list. Handlers run outside the lock so they may subscribe.
#[derive(Default)]
pub(crate) struct Subscribers {
    handlers: Mutex<Vec<Handler>>,
}

impl Subscribers {
    pub(crate) fn push(&self, handler: Handler) {
        self.handlers
            .lock()
            .expect("subscriber lock poisoned")
            .push(handler);
    }

    pub(crate) fn emit(&self, event: &ExecutionEvent<'_>) {
        let handlers = self
            .handlers
            .lock()
            .expect("subscriber lock poisoned")
            .clone();
        for handler in handlers {
            handler(event);
        }
    }

    pub(crate) fn clear(&self) {
        self.handlers
            .lock()
            .expect("subscriber lock poisoned")
            .clear();
    }
}
