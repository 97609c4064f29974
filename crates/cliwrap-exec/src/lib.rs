// SPDX-License-Identifier: MIT OR Apache-2.0
//! cliwrap-exec
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Running wrapped programs and consuming their parsed output.
//!
//! An [`Executable`] names a program and registers [`Command`]s for it.
//! Each call builds an argument string from an input record and creates
//! an [`Execution`], which spawns the program on Tokio, feeds every output
//! line to the command's processor and publishes the resulting objects as
//! [`ExecutionEvent`]s. Three consumption modes sit on top of the events:
//!
//! - [`Execution::parse_as_list`] (and its blocking and spawned forms)
//!   collects objects until exit;
//! - [`Execution::parse_as_stream`] yields them as they arrive;
//! - [`DispatchTable`] picks a mode from an operation's declared result
//!   shape.
//!
//! [`Command`]: cliwrap_args::Command

pub mod dispatch;
pub mod error;
pub mod events;
pub mod executable;
pub mod execution;
pub mod kill;
pub mod lifecycle;
pub mod which;

pub use dispatch::{DispatchTable, Dispatched, ResultShape};
pub use error::ExecError;
pub use events::{ExecutionEvent, ExitInfo};
pub use executable::{Executable, ExecutionConfigurator};
pub use execution::Execution;
pub use kill::KillSwitch;
pub use lifecycle::{LifecycleError, LifecycleManager, LifecycleState, LifecycleTransition};
pub use which::{program_exists, which};
