// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caller-registered conversion functions used by the capture engine.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use regex::Captures;
use serde::Serialize;
use serde_json::Value;

use super::GroupMap;
use crate::{ParsedObject, ProcessorError};

/// Converts the captures of one field into an intermediate JSON value that
/// is then deserialized into the field's type.
pub(crate) type FieldFn = dyn Fn(&[String]) -> Result<Value, String> + Send + Sync;

/// Builds a whole target object from the raw match.
pub(crate) type ObjectFn =
    dyn Fn(&Captures<'_>, &GroupMap) -> Result<ParsedObject, ProcessorError> + Send + Sync;

/// Field converters, keyed by the serde name of the field type.
#[derive(Default, Clone)]
pub(crate) struct FieldConverters {
    by_name: HashMap<String, Arc<FieldFn>>,
}

impl FieldConverters {
    /// Register a converter fed with the last capture. A group that
    /// captured nothing yields `T::default()` without calling `convert`.
    pub(crate) fn insert_scalar<T, E, F>(&mut self, type_name: &str, convert: F)
    where
        T: Serialize + Default,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let f = move |caps: &[String]| -> Result<Value, String> {
            let last = caps.last().map(String::as_str).unwrap_or_default();
            let value = if last.is_empty() {
                T::default()
            } else {
                convert(last).map_err(|e| e.to_string())?
            };
            serde_json::to_value(value).map_err(|e| e.to_string())
        };
        self.by_name.insert(type_name.to_string(), Arc::new(f));
    }

    /// Register a converter fed with every capture of the group, or
    /// `T::default()` when every capture is empty.
    pub(crate) fn insert_array<T, E, F>(&mut self, type_name: &str, convert: F)
    where
        T: Serialize + Default,
        E: Display,
        F: Fn(&[String]) -> Result<T, E> + Send + Sync + 'static,
    {
        let f = move |caps: &[String]| -> Result<Value, String> {
            let value = if caps.iter().all(String::is_empty) {
                T::default()
            } else {
                convert(caps).map_err(|e| e.to_string())?
            };
            serde_json::to_value(value).map_err(|e| e.to_string())
        };
        self.by_name.insert(type_name.to_string(), Arc::new(f));
    }

    pub(crate) fn get(&self, type_name: &str) -> Option<&Arc<FieldFn>> {
        self.by_name.get(type_name)
    }
}

/// Whole-object overrides, keyed by target type.
#[derive(Default, Clone)]
pub(crate) struct ObjectConverters {
    by_type: HashMap<TypeId, Arc<ObjectFn>>,
}

impl ObjectConverters {
    /// Register an override fed with the raw match.
    pub(crate) fn insert_match<T, E, F>(&mut self, convert: F)
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&Captures<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        let f = move |caps: &Captures<'_>, _: &GroupMap| {
            convert(caps)
                .map(ParsedObject::new)
                .map_err(|e| ProcessorError::conversion::<T>(e))
        };
        self.by_type.insert(TypeId::of::<T>(), Arc::new(f));
    }

    /// Register an override fed with the group mapping.
    pub(crate) fn insert_groups<T, E, F>(&mut self, convert: F)
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&GroupMap) -> Result<T, E> + Send + Sync + 'static,
    {
        let f = move |_: &Captures<'_>, groups: &GroupMap| {
            convert(groups)
                .map(ParsedObject::new)
                .map_err(|e| ProcessorError::conversion::<T>(e))
        };
        self.by_type.insert(TypeId::of::<T>(), Arc::new(f));
    }

    pub(crate) fn get(&self, target: TypeId) -> Option<&Arc<ObjectFn>> {
        self.by_type.get(&target)
    }
}
