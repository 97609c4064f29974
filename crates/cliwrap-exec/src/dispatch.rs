// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-dispatch table: operation identifiers mapped to commands and
//! result shapes.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{ExecError, Executable, Execution};

/// What a dispatched operation hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// Run to completion, discard output.
    Nothing,
    /// Start and return the running execution.
    Execution,
    /// Run to completion and return the first object.
    Single,
    /// Run to completion and return every object.
    List,
    /// Start and return a live stream of objects.
    Stream,
}

/// The result of [`DispatchTable::dispatch`], matching the operation's
/// [`ResultShape`].
#[derive(Debug)]
pub enum Dispatched<T> {
    /// [`ResultShape::Nothing`].
    Nothing,
    /// [`ResultShape::Execution`].
    Execution(Execution),
    /// [`ResultShape::Single`].
    Single(Option<T>),
    /// [`ResultShape::List`].
    List(Vec<T>),
    /// [`ResultShape::Stream`].
    Stream(UnboundedReceiverStream<T>),
}

#[derive(Debug, Clone)]
struct Operation {
    command: String,
    shape: ResultShape,
}

/// Operation identifier → (command, result shape), built once at setup.
#[derive(Debug)]
pub struct DispatchTable {
    executable: Executable,
    operations: BTreeMap<String, Operation>,
}

impl DispatchTable {
    /// Create an empty table over `executable`.
    pub fn new(executable: Executable) -> Self {
        Self {
            executable,
            operations: BTreeMap::new(),
        }
    }

    /// Map `operation` to `command`. Fails if the command is unknown.
    pub fn route(
        mut self,
        operation: impl Into<String>,
        command: &str,
        shape: ResultShape,
    ) -> Result<Self, ExecError> {
        if !self.executable.contains(command) {
            return Err(ExecError::UnknownCommand {
                name: command.to_string(),
            });
        }
        self.operations.insert(
            operation.into(),
            Operation {
                command: command.to_string(),
                shape,
            },
        );
        Ok(self)
    }

    /// The wrapped executable.
    pub fn executable(&self) -> &Executable {
        &self.executable
    }

    /// Result shape declared for `operation`.
    pub fn shape(&self, operation: &str) -> Option<ResultShape> {
        self.operations.get(operation).map(|op| op.shape)
    }

    /// Declared operation identifiers in sorted order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Run `operation` for `input` in the consumption mode its result shape
    /// implies, collecting objects of type `T`.
    pub async fn dispatch<T>(
        &self,
        operation: &str,
        input: &(impl Serialize + ?Sized),
    ) -> Result<Dispatched<T>, ExecError>
    where
        T: Any + Send + Sync + Clone,
    {
        let op = self
            .operations
            .get(operation)
            .ok_or_else(|| ExecError::UnknownOperation {
                name: operation.to_string(),
            })?;
        let execution = self.executable.create_execution(&op.command, input)?;
        Ok(match op.shape {
            ResultShape::Nothing => {
                execution.parse_as_list::<T>().await?;
                Dispatched::Nothing
            }
            ResultShape::Execution => {
                execution.start()?;
                Dispatched::Execution(execution)
            }
            ResultShape::Single => {
                Dispatched::Single(execution.parse_as_list::<T>().await?.into_iter().next())
            }
            ResultShape::List => Dispatched::List(execution.parse_as_list::<T>().await?),
            ResultShape::Stream => Dispatched::Stream(execution.parse_as_stream::<T>()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliwrap_args::ParamType;
    use serde_json::json;

    fn table() -> DispatchTable {
        let mut exe = Executable::new("echo");
        exe.add("say")
            .add_parameter("text", ParamType::Text, "")
            .unwrap();
        DispatchTable::new(exe)
            .route("greet", "say", ResultShape::Single)
            .unwrap()
            .route("chatter", "say", ResultShape::Stream)
            .unwrap()
    }

    #[test]
    fn routes_are_looked_up_by_operation() {
        let t = table();
        assert_eq!(t.shape("greet"), Some(ResultShape::Single));
        assert_eq!(t.operations().collect::<Vec<_>>(), ["chatter", "greet"]);
        assert!(t.shape("missing").is_none());
    }

    #[test]
    fn routing_to_an_unknown_command_fails_at_setup() {
        let err = table()
            .route("x", "nope", ResultShape::List)
            .unwrap_err();
        assert!(matches!(err, ExecError::UnknownCommand { ref name } if name == "nope"));
    }

    #[tokio::test]
    async fn dispatching_an_unknown_operation_fails() {
        let err = table()
            .dispatch::<String>("missing", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::UnknownOperation { .. }));
    }

    #[test]
    fn result_shapes_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ResultShape::Nothing).unwrap(),
            "\"nothing\""
        );
    }
}
