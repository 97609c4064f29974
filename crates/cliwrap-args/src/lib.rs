// SPDX-License-Identifier: MIT OR Apache-2.0
//! cliwrap-args
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Argument construction for wrapped command-line programs.
//!
//! A [`Command`] is a named, ordered set of parameter slots ([`Parameter`]
//! for values, [`Switch`] for presence flags). Given an input record it
//! renders a single argument string: slots are visited in ascending
//! priority (ties keep declaration order), each formats its value or is
//! omitted, and the surviving pieces are joined with the command's
//! parameter separator.
//!
//! Input records are anything `serde` can serialize. Objects map field
//! names to values, arrays are positional, and `null` is an empty record.

pub mod binding;
pub mod command;
pub mod error;
pub mod naming;
pub mod parameter;
pub mod value;

pub use binding::{ArgumentShape, Binding, FieldBinding, Shape, SlotSpec, resolve};
pub use command::{Command, CommandDefaults};
pub use error::ArgsError;
pub use naming::{InferredName, infer_name};
pub use parameter::{Parameter, Slot, Switch};
pub use value::ParamType;
