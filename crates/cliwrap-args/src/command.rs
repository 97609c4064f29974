// SPDX-License-Identifier: MIT OR Apache-2.0
//! Commands and the record-to-argument-string compiler.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use cliwrap_output::SharedProcessor;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::binding::{ArgumentShape, Shape, resolve};
use crate::error::ArgsError;
use crate::parameter::{Parameter, Slot, Switch};
use crate::value::{ParamType, kind};

/// Defaults applied to slots created through a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefaults {
    /// Prefix for names that carry none. Without it, names longer than one
    /// character use `--` and others `-`.
    pub prefix: Option<String>,
    /// Separator between name and value for names that carry none (a single
    /// space if unset).
    pub value_separator: Option<String>,
    /// Quote for values containing whitespace (`"` if unset).
    pub space_encapsulation: Option<String>,
    /// Text joining formatted slots.
    pub parameter_separator: String,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            prefix: None,
            value_separator: None,
            space_encapsulation: None,
            parameter_separator: " ".to_string(),
        }
    }
}

/// Which input key feeds each slot, for one record shape.
type Plan = Arc<Vec<Option<String>>>;

/// A named, ordered set of slots that turns input records into argument
/// strings.
pub struct Command {
    name: String,
    defaults: CommandDefaults,
    slots: Vec<Slot>,
    /// `(record field, slot index)` in declaration order.
    mappings: Vec<(String, usize)>,
    processor: Option<SharedProcessor>,
    throw_on_error_while_parse: bool,
    abort_on_error_while_parse: bool,
    cache_mappings: bool,
    plans: Mutex<HashMap<Vec<String>, Plan>>,
}

impl Command {
    /// Create an empty command.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_defaults(name, CommandDefaults::default())
    }

    /// Create an empty command whose slots inherit `defaults`.
    pub fn with_defaults(name: impl Into<String>, defaults: CommandDefaults) -> Self {
        Self {
            name: name.into(),
            defaults,
            slots: Vec::new(),
            mappings: Vec::new(),
            processor: None,
            throw_on_error_while_parse: false,
            abort_on_error_while_parse: false,
            cache_mappings: false,
            plans: Mutex::new(HashMap::new()),
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot defaults.
    pub fn defaults(&self) -> &CommandDefaults {
        &self.defaults
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name() == name)
    }

    /// `(record field, slot name)` bindings in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings
            .iter()
            .map(|(field, idx)| (field.as_str(), self.slots[*idx].name()))
    }

    /// Attached output processor.
    pub fn processor(&self) -> Option<&SharedProcessor> {
        self.processor.as_ref()
    }

    /// Attach an output processor.
    pub fn set_processor(&mut self, processor: SharedProcessor) -> &mut Self {
        self.processor = Some(processor);
        self
    }

    /// Re-raise the first parse error from executions of this command.
    pub fn throw_on_error_while_parse(&self) -> bool {
        self.throw_on_error_while_parse
    }

    /// Set [`throw_on_error_while_parse`](Self::throw_on_error_while_parse).
    pub fn set_throw_on_error_while_parse(&mut self, throw: bool) -> &mut Self {
        self.throw_on_error_while_parse = throw;
        self
    }

    /// Kill executions of this command on their first parse error.
    pub fn abort_on_error_while_parse(&self) -> bool {
        self.abort_on_error_while_parse
    }

    /// Set [`abort_on_error_while_parse`](Self::abort_on_error_while_parse).
    pub fn set_abort_on_error_while_parse(&mut self, abort: bool) -> &mut Self {
        self.abort_on_error_while_parse = abort;
        self
    }

    /// Returns `true` if field-to-slot plans are memoized per record shape.
    pub fn cache_mappings(&self) -> bool {
        self.cache_mappings
    }

    /// Memoize field-to-slot plans per record shape.
    pub fn set_cache_mappings(&mut self, cache: bool) -> &mut Self {
        self.cache_mappings = cache;
        self.invalidate();
        self
    }

    /// Set the text joining formatted slots.
    pub fn set_parameter_separator(&mut self, separator: impl Into<String>) -> &mut Self {
        self.defaults.parameter_separator = separator.into();
        self
    }

    /// A value parameter carrying this command's defaults, ready for
    /// further configuration and [`add`](Self::add).
    pub fn new_parameter(&self, name: &str) -> Parameter {
        Parameter::with_defaults(name, &self.defaults)
    }

    /// A switch carrying this command's defaults.
    pub fn new_switch(&self, name: &str) -> Switch {
        Switch::with_defaults(name, &self.defaults)
    }

    /// Add a slot, bound to the record field of the same name.
    pub fn add(&mut self, slot: impl Into<Slot>) -> Result<&mut Self, ArgsError> {
        let slot = slot.into();
        let name = slot.name().to_string();
        self.insert(&name, slot)?;
        Ok(self)
    }

    /// Add a value parameter of type `ty` with `default`.
    pub fn add_parameter(
        &mut self,
        name: &str,
        ty: ParamType,
        default: impl Into<Value>,
    ) -> Result<&mut Self, ArgsError> {
        let parameter = self.new_parameter(name).with_type(ty).with_default(default);
        self.add(parameter)
    }

    /// Add a switch with `default`.
    pub fn add_switch(&mut self, name: &str, default: bool) -> Result<&mut Self, ArgsError> {
        let switch = self.new_switch(name).with_default(default);
        self.add(switch)
    }

    /// Add the slots described by `shape`.
    ///
    /// A binding whose slot name is already declared reuses that slot and
    /// only records the field mapping.
    pub fn add_shape(&mut self, shape: &Shape) -> Result<&mut Self, ArgsError> {
        for spec in resolve(shape, &self.defaults)? {
            match self.position(spec.slot.name()) {
                Some(idx) => self.mappings.push((spec.field, idx)),
                None => self.insert(&spec.field, spec.slot)?,
            }
        }
        self.invalidate();
        Ok(self)
    }

    /// [`add_shape`](Self::add_shape) for a record type.
    pub fn add_shape_of<T: ArgumentShape>(&mut self) -> Result<&mut Self, ArgsError> {
        self.add_shape(&T::shape())
    }

    /// Remove every slot and binding.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.mappings.clear();
        self.invalidate();
    }

    /// Build the argument string for `input`.
    ///
    /// Objects are matched by slot name first, then by bound field name.
    /// Arrays are assigned to field bindings in declaration order. `null`
    /// formats every slot against no value.
    pub fn construct_arguments(&self, input: &Value) -> Result<String, ArgsError> {
        let values: Vec<Option<&Value>> = match input {
            Value::Null => vec![None; self.slots.len()],
            Value::Object(record) => self.project(record),
            Value::Array(items) => self.positional(items),
            other => {
                return Err(ArgsError::UnsupportedInput { kind: kind(other) });
            }
        };
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&idx| self.slots[idx].priority());
        let parts: Vec<String> = order
            .into_iter()
            .filter_map(|idx| self.slots[idx].format(values[idx]))
            .collect();
        Ok(parts.join(&self.defaults.parameter_separator))
    }

    /// Serialize `input` and build its argument string.
    pub fn construct_arguments_from<T: Serialize + ?Sized>(
        &self,
        input: &T,
    ) -> Result<String, ArgsError> {
        self.construct_arguments(&serde_json::to_value(input)?)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name() == name)
    }

    fn insert(&mut self, field: &str, slot: Slot) -> Result<(), ArgsError> {
        if slot.name().is_empty() {
            return Err(ArgsError::UnnamedParameter {
                field: field.to_string(),
            });
        }
        if self.position(slot.name()).is_some() {
            return Err(ArgsError::DuplicateParameter {
                command: self.name.clone(),
                name: slot.name().to_string(),
            });
        }
        self.slots.push(slot);
        self.mappings.push((field.to_string(), self.slots.len() - 1));
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        self.plans.lock().expect("mapping cache lock poisoned").clear();
    }

    fn project<'v>(&self, record: &'v Map<String, Value>) -> Vec<Option<&'v Value>> {
        self.plan(record)
            .iter()
            .map(|key| key.as_deref().and_then(|k| record.get(k)))
            .collect()
    }

    fn plan(&self, record: &Map<String, Value>) -> Plan {
        if !self.cache_mappings {
            return Arc::new(self.build_plan(record));
        }
        let mut shape: Vec<String> = record.keys().cloned().collect();
        shape.sort();
        let mut plans = self.plans.lock().expect("mapping cache lock poisoned");
        if let Some(plan) = plans.get(&shape) {
            return Arc::clone(plan);
        }
        tracing::debug!(target: "cliwrap.args", command = %self.name, fields = shape.len(), "building field mapping");
        let plan = Arc::new(self.build_plan(record));
        plans.insert(shape, Arc::clone(&plan));
        plan
    }

    fn build_plan(&self, record: &Map<String, Value>) -> Vec<Option<String>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                if record.contains_key(slot.name()) {
                    return Some(slot.name().to_string());
                }
                self.mappings
                    .iter()
                    .find(|(field, target)| *target == idx && record.contains_key(field))
                    .map(|(field, _)| field.clone())
            })
            .collect()
    }

    fn positional<'v>(&self, items: &'v [Value]) -> Vec<Option<&'v Value>> {
        let mut values = vec![None; self.slots.len()];
        if items.len() > self.mappings.len() {
            tracing::debug!(
                target: "cliwrap.args",
                command = %self.name,
                supplied = items.len(),
                bound = self.mappings.len(),
                "ignoring surplus positional arguments"
            );
        }
        for ((_, idx), item) in self.mappings.iter().zip(items) {
            if values[*idx].is_none() {
                values[*idx] = Some(item);
            }
        }
        values
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("slots", &self.slots)
            .field("mappings", &self.mappings)
            .field("has_processor", &self.processor.is_some())
            .field("throw_on_error_while_parse", &self.throw_on_error_while_parse)
            .field("abort_on_error_while_parse", &self.abort_on_error_while_parse)
            .field("cache_mappings", &self.cache_mappings)
            .finish_non_exhaustive()
    }
}
