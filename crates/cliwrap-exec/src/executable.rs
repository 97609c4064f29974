// SPDX-License-Identifier: MIT OR Apache-2.0
//! Executable registry: one program, many named commands.

use std::any::Any;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use cliwrap_args::{ArgsError, Command, CommandDefaults};
use cliwrap_output::ParsedObject;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::{ExecError, Execution};

/// Hook run on every execution an [`Executable`] creates, before it is
/// returned or started.
pub trait ExecutionConfigurator: Send + Sync {
    /// Adjust `execution`, created from `command` for `input`.
    fn configure(&self, command: &Command, input: &Value, execution: &mut Execution);
}

impl<F> ExecutionConfigurator for F
where
    F: Fn(&Command, &Value, &mut Execution) + Send + Sync,
{
    fn configure(&self, command: &Command, input: &Value, execution: &mut Execution) {
        self(command, input, execution)
    }
}

/// A program and the commands it can be run with.
///
/// Commands created through [`add`](Self::add) inherit the executable's
/// [`CommandDefaults`].
#[derive(Default)]
pub struct Executable {
    program: String,
    defaults: CommandDefaults,
    commands: BTreeMap<String, Command>,
    configurator: Option<Arc<dyn ExecutionConfigurator>>,
}

impl Executable {
    /// Create a registry for `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self::with_defaults(program, CommandDefaults::default())
    }

    /// Create a registry whose commands inherit `defaults`.
    pub fn with_defaults(program: impl Into<String>, defaults: CommandDefaults) -> Self {
        Self {
            program: program.into(),
            defaults,
            commands: BTreeMap::new(),
            configurator: None,
        }
    }

    /// Program launched by every command.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Replace the program.
    pub fn set_program(&mut self, program: impl Into<String>) -> &mut Self {
        self.program = program.into();
        self
    }

    /// Defaults handed to commands created from now on.
    pub fn defaults(&self) -> &CommandDefaults {
        &self.defaults
    }

    /// Replace the defaults. Existing commands keep theirs.
    pub fn set_defaults(&mut self, defaults: CommandDefaults) -> &mut Self {
        self.defaults = defaults;
        self
    }

    /// Install the execution configurator.
    pub fn set_configurator(
        &mut self,
        configurator: impl ExecutionConfigurator + 'static,
    ) -> &mut Self {
        self.configurator = Some(Arc::new(configurator));
        self
    }

    /// Create a command under `name`, replacing any previous entry.
    pub fn add(&mut self, name: &str) -> &mut Command {
        self.add_command(Command::with_defaults(name, self.defaults.clone()))
    }

    /// Register an existing command under its own name, replacing any
    /// previous entry.
    pub fn add_command(&mut self, command: Command) -> &mut Command {
        match self.commands.entry(command.name().to_string()) {
            Entry::Occupied(mut entry) => {
                debug!(target: "cliwrap.exec", command = %entry.key(), "replacing command");
                entry.insert(command);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(command),
        }
    }

    /// Look up a command.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Look up a command for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.get_mut(name)
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Remove a command, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Command> {
        self.commands.remove(name)
    }

    /// Remove every command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of registered commands.
    pub fn count(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    /// Resolve the program on `PATH`.
    pub fn resolve_program(&self) -> Option<PathBuf> {
        crate::which(&self.program)
    }

    /// Create, but do not start, an execution of `name` for `input`.
    pub fn create_execution(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<Execution, ExecError> {
        let command = self.get(name).ok_or_else(|| ExecError::UnknownCommand {
            name: name.to_string(),
        })?;
        let input = serde_json::to_value(input).map_err(ArgsError::from)?;
        let arguments = command.construct_arguments(&input)?;
        let mut execution = Execution::from_command(&self.program, command, arguments);
        if let Some(configurator) = &self.configurator {
            configurator.configure(command, &input, &mut execution);
        }
        Ok(execution)
    }

    /// Create and start an execution.
    pub fn execute_command(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<Execution, ExecError> {
        let execution = self.create_execution(name, input)?;
        execution.start()?;
        Ok(execution)
    }

    /// Create and start an execution, handing every parsed object to
    /// `on_output`.
    pub fn execute_command_with(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
        on_output: impl Fn(&ParsedObject) + Send + Sync + 'static,
    ) -> Result<Execution, ExecError> {
        let execution = self.create_execution(name, input)?;
        execution.on_output(on_output);
        execution.start()?;
        Ok(execution)
    }

    /// Run `name` to completion and collect its objects of type `T`.
    pub async fn execute_and_collect<T>(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<Vec<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.create_execution(name, input)?.parse_as_list().await
    }

    /// Blocking form of [`execute_and_collect`](Self::execute_and_collect).
    pub fn execute_and_collect_blocking<T>(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<Vec<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.create_execution(name, input)?.parse_as_list_blocking()
    }

    /// Run `name` on a background task and collect its objects of type `T`.
    pub fn spawn_execute_and_collect<T>(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<JoinHandle<Result<Vec<T>, ExecError>>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        Ok(self.create_execution(name, input)?.spawn_parse_as_list())
    }

    /// Start `name` and stream its objects of type `T`.
    pub fn execute_as_stream<T>(
        &self,
        name: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<UnboundedReceiverStream<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        self.create_execution(name, input)?.parse_as_stream()
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("program", &self.program)
            .field("defaults", &self.defaults)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("has_configurator", &self.configurator.is_some())
            .finish()
    }
}
