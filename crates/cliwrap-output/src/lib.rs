// SPDX-License-Identifier: MIT OR Apache-2.0
//! cliwrap-output
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Output processors for wrapped command-line programs.
//!
//! An [`OutputProcessor`] receives every completed stdout and stderr line of
//! a running program and turns it into zero or more [`ParsedObject`]s. The
//! processors in this crate compose: [`LineProcessor`] passes lines through
//! (or combines them), [`FanOutProcessor`] clones each line to several
//! children, [`RouteProcessor`] picks a child by pattern, and
//! [`CaptureProcessor`] converts named regex captures into typed values.

pub mod capture;
pub mod error;
pub mod fanout;
pub mod lines;
pub mod object;
pub mod processor;
pub mod route;

pub use capture::{CaptureProcessor, GroupMap};
pub use error::ProcessorError;
pub use fanout::FanOutProcessor;
pub use lines::LineProcessor;
pub use object::ParsedObject;
pub use processor::{ExecutionContext, OutputProcessor, SharedProcessor, Stream};
pub use route::RouteProcessor;
