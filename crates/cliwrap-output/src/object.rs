// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-erased envelope for values produced by output processors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value emitted by an output processor.
///
/// Processors in a chain may emit values of different types (plain lines,
/// captured records, group maps), so the envelope erases the type and
/// consumers recover it with [`downcast_ref`](Self::downcast_ref) or
/// [`downcast`](Self::downcast). Cloning is cheap: the value is shared.
#[derive(Clone)]
pub struct ParsedObject {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ParsedObject {
    /// Wrap `value`.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the wrapped value out as a `T`.
    ///
    /// The value is moved out when this is the last handle to it and
    /// cloned otherwise. On a type mismatch the envelope is handed back.
    pub fn downcast<T: Any + Send + Sync + Clone>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(Arc::unwrap_or_clone(value)),
            Err(value) => Err(Self { value, type_name }),
        }
    }
}

impl fmt::Debug for ParsedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedObject")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
