// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative binding descriptors and their resolution into slots.
//!
//! A [`Shape`] describes the fields of an input record and how each one
//! becomes a command-line slot. [`resolve`] turns it into slot specs
//! without inspecting any value.

use serde_json::Value;

use crate::command::CommandDefaults;
use crate::error::ArgsError;
use crate::parameter::{Parameter, Slot, Switch};
use crate::value::ParamType;

/// One binding descriptor attached to a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Bind the field to a value parameter.
    Parameter {
        /// Slot name (terse form allowed), if not the field name.
        name: Option<String>,
        /// Value used when the field is zero.
        default: Option<Value>,
        /// Emission priority.
        priority: Option<i32>,
    },
    /// Bind the field to a switch.
    Switch {
        /// Slot name (terse form allowed), if not the field name.
        name: Option<String>,
        /// State used when the field is absent.
        default: Option<bool>,
        /// Emission priority.
        priority: Option<i32>,
    },
    /// Emit only the value of the bound parameter.
    HideName,
    /// Explicit slot name, overriding any other.
    Name(String),
}

impl Binding {
    /// A value-parameter binding with no overrides.
    pub fn parameter() -> Self {
        Self::Parameter {
            name: None,
            default: None,
            priority: None,
        }
    }

    /// A switch binding with no overrides.
    pub fn switch() -> Self {
        Self::Switch {
            name: None,
            default: None,
            priority: None,
        }
    }

    fn is_kind(&self) -> bool {
        matches!(self, Self::Parameter { .. } | Self::Switch { .. })
    }
}

/// Bindings of one record field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    /// Field name as it appears in the serialized record.
    pub field: String,
    /// Declared type of the field.
    pub ty: ParamType,
    /// Descriptors, applied in order; later ones win.
    pub bindings: Vec<Binding>,
}

/// Description of an input record shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    /// Fields in declaration order. Positional input follows this order.
    pub fields: Vec<FieldBinding>,
}

impl Shape {
    /// An empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    #[must_use]
    pub fn field(
        mut self,
        field: impl Into<String>,
        ty: ParamType,
        bindings: impl IntoIterator<Item = Binding>,
    ) -> Self {
        self.fields.push(FieldBinding {
            field: field.into(),
            ty,
            bindings: bindings.into_iter().collect(),
        });
        self
    }
}

/// Record types that describe their own shape.
pub trait ArgumentShape {
    /// The shape of `Self` when serialized.
    fn shape() -> Shape;
}

/// A resolved slot and the field it is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    /// Record field name.
    pub field: String,
    /// The slot.
    pub slot: Slot,
}

/// Resolve `shape` into slot specs, one per field, in declaration order.
///
/// Fields without a kind binding become value parameters of the field's
/// type. The slot name is the last [`Binding::Name`], else the name given
/// in the kind binding, else the field name.
pub fn resolve(shape: &Shape, defaults: &CommandDefaults) -> Result<Vec<SlotSpec>, ArgsError> {
    shape
        .fields
        .iter()
        .map(|field| resolve_field(field, defaults))
        .collect()
}

fn resolve_field(field: &FieldBinding, defaults: &CommandDefaults) -> Result<SlotSpec, ArgsError> {
    let explicit = field.bindings.iter().rev().find_map(|b| match b {
        Binding::Name(name) => Some(name.as_str()),
        _ => None,
    });
    let hide_name = field.bindings.contains(&Binding::HideName);
    let kind = field.bindings.iter().rev().find(|b| b.is_kind());

    let slot: Slot = match kind {
        Some(Binding::Switch {
            name,
            default,
            priority,
        }) => {
            let name = explicit.or(name.as_deref()).unwrap_or(&field.field);
            Switch::with_defaults(name, defaults)
                .with_default(default.unwrap_or(false))
                .with_priority(priority.unwrap_or(0))
                .into()
        }
        other => {
            let (name, default, priority) = match other {
                Some(Binding::Parameter {
                    name,
                    default,
                    priority,
                }) => (name.as_deref(), default.clone(), *priority),
                _ => (None, None, None),
            };
            let name = explicit.or(name).unwrap_or(&field.field);
            Parameter::with_defaults(name, defaults)
                .with_type(field.ty.clone())
                .with_default(default.unwrap_or(Value::Null))
                .with_priority(priority.unwrap_or(0))
                .with_hide_name(hide_name)
                .into()
        }
    };
    if slot.name().is_empty() {
        return Err(ArgsError::UnnamedParameter {
            field: field.field.clone(),
        });
    }
    Ok(SlotSpec {
        field: field.field.clone(),
        slot,
    })
}
