// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for wrapped executables.
//!
//! An [`ExecutableConfig`] describes one program and its commands in TOML.
//! It can be validated into hard errors and advisory [`ConfigWarning`]s,
//! layered with [`merge_configs`], overridden from the environment, and
//! finally built into a ready-to-run [`Executable`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use cliwrap_args::{Binding, CommandDefaults, ParamType, Shape, infer_name};
use cliwrap_exec::Executable;
use cliwrap_output::{LineProcessor, SharedProcessor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading, validation or building.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },

    /// A command could not be assembled from its parameters.
    #[error("command '{command}' could not be built: {reason}")]
    BuildError {
        /// Command name.
        command: String,
        /// Underlying failure.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A command declares no parameters.
    CommandWithoutParameters {
        /// Command name.
        command: String,
    },
    /// `abort_on_error_while_parse` is set without `throw_on_error_while_parse`.
    AbortWithoutThrow {
        /// Command name.
        command: String,
    },
    /// Parse error policies are set on a command that parses nothing.
    PolicyWithoutOutput {
        /// Command name.
        command: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::CommandWithoutParameters { command } => {
                write!(f, "command '{command}' declares no parameters")
            }
            ConfigWarning::AbortWithoutThrow { command } => write!(
                f,
                "command '{command}' aborts on parse errors without throwing; the first error is still returned"
            ),
            ConfigWarning::PolicyWithoutOutput { command } => write!(
                f,
                "command '{command}' sets parse error policies but has output = \"none\""
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// One wrapped program and its commands.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ExecutableConfig {
    /// Program name or path.
    #[serde(default)]
    pub program: String,

    /// Defaults inherited by every command's parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Named commands.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,
}

/// Parameter defaults shared by a program's commands.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Prefix for names that carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Separator between name and value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_separator: Option<String>,
    /// Quote for values containing whitespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_encapsulation: Option<String>,
    /// Text joining formatted parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_separator: Option<String>,
}

impl DefaultsConfig {
    /// Convert into the runtime defaults.
    pub fn to_command_defaults(&self) -> CommandDefaults {
        let base = CommandDefaults::default();
        CommandDefaults {
            prefix: self.prefix.clone(),
            value_separator: self.value_separator.clone(),
            space_encapsulation: self.space_encapsulation.clone(),
            parameter_separator: self
                .parameter_separator
                .clone()
                .unwrap_or(base.parameter_separator),
        }
    }
}

/// One command of a program.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct CommandConfig {
    /// How output lines are parsed.
    #[serde(default)]
    pub output: OutputMode,
    /// Re-raise the first parse error when collection completes.
    #[serde(default)]
    pub throw_on_error_while_parse: bool,
    /// Kill the process on the first parse error.
    #[serde(default)]
    pub abort_on_error_while_parse: bool,
    /// Cache the field mapping per input record shape.
    #[serde(default)]
    pub cache_mappings: bool,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

/// Output handling for a command.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Streams are inherited; nothing is parsed.
    #[default]
    None,
    /// Every non-empty line becomes a string.
    Lines,
    /// All lines become one string at exit.
    Combined,
}

impl OutputMode {
    /// The processor implementing this mode, if any.
    pub fn processor(self) -> Option<SharedProcessor> {
        match self {
            OutputMode::None => None,
            OutputMode::Lines => Some(Arc::new(LineProcessor::new())),
            OutputMode::Combined => Some(Arc::new(LineProcessor::combined())),
        }
    }
}

/// Kind of command-line slot.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// `name value`.
    #[default]
    Parameter,
    /// Bare `name` when on.
    Switch,
}

/// Declared value type of a parameter.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Anything.
    #[default]
    Any,
    /// Booleans.
    Bool,
    /// Integers.
    Integer,
    /// Numbers.
    Float,
    /// Strings.
    Text,
}

impl From<ValueType> for ParamType {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::Any => ParamType::Any,
            ValueType::Bool => ParamType::Bool,
            ValueType::Integer => ParamType::Integer,
            ValueType::Float => ParamType::Float,
            ValueType::Text => ParamType::Text,
        }
    }
}

/// One parameter of a command.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ParameterConfig {
    /// Slot name; terse forms such as `-n` or `/size:` carry their own
    /// prefix and separator.
    pub name: String,
    /// Slot kind.
    #[serde(default)]
    pub kind: SlotKind,
    /// Declared value type.
    #[serde(default, rename = "type")]
    pub ty: ValueType,
    /// Whether `null` is the only zero value.
    #[serde(default)]
    pub optional: bool,
    /// Value used when the input is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Emission priority; lower first.
    #[serde(default)]
    pub priority: i32,
    /// Emit only the value.
    #[serde(default)]
    pub hide_name: bool,
    /// Input record field bound to this slot, if not the slot name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ParameterConfig {
    fn declared_type(&self) -> ParamType {
        let ty = ParamType::from(self.ty);
        if self.optional { ty.optional() } else { ty }
    }

    fn bindings(&self) -> Vec<Binding> {
        let name = Some(self.name.clone());
        let priority = Some(self.priority);
        let mut bindings = vec![match self.kind {
            SlotKind::Parameter => Binding::Parameter {
                name,
                default: self.default.clone(),
                priority,
            },
            SlotKind::Switch => Binding::Switch {
                name,
                default: self.default.as_ref().and_then(Value::as_bool),
                priority,
            },
        }];
        if self.hide_name {
            bindings.push(Binding::HideName);
        }
        bindings
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load an [`ExecutableConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, starts from [`ExecutableConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<ExecutableConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => ExecutableConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into an [`ExecutableConfig`].
pub fn parse_toml(content: &str) -> Result<ExecutableConfig, ConfigError> {
    toml::from_str::<ExecutableConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

/// JSON schema of the configuration file.
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(ExecutableConfig)
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `CLIWRAP_PROGRAM`
/// - `CLIWRAP_PARAMETER_PREFIX`
pub fn apply_env_overrides(config: &mut ExecutableConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// [`apply_env_overrides`] with a custom variable lookup.
pub fn apply_overrides_from(
    config: &mut ExecutableConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(program) = lookup("CLIWRAP_PROGRAM") {
        tracing::debug!(target: "cliwrap.config", %program, "program overridden from environment");
        config.program = program;
    }
    if let Some(prefix) = lookup("CLIWRAP_PARAMETER_PREFIX") {
        config.defaults.get_or_insert_with(DefaultsConfig::default).prefix = Some(prefix);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (empty program, empty or duplicate names, non-boolean switch
/// defaults) are returned as a [`ConfigError::ValidationError`]; soft
/// issues come back as warnings.
pub fn validate_config(config: &ExecutableConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.program.trim().is_empty() {
        errors.push("program must not be empty".into());
    }

    for (name, command) in &config.commands {
        if name.trim().is_empty() {
            errors.push("command name must not be empty".into());
        }

        let mut seen = BTreeSet::new();
        for param in &command.parameters {
            let slot = infer_name(&param.name).name;
            if slot.is_empty() {
                errors.push(format!(
                    "command '{name}': parameter name '{}' must not be empty",
                    param.name
                ));
                continue;
            }
            if !seen.insert(slot.clone()) {
                errors.push(format!(
                    "command '{name}': duplicate parameter '{slot}'"
                ));
            }
            if param.kind == SlotKind::Switch
                && param.default.as_ref().is_some_and(|d| !d.is_boolean())
            {
                errors.push(format!(
                    "command '{name}': switch '{slot}' must have a boolean default"
                ));
            }
        }

        if command.parameters.is_empty() {
            warnings.push(ConfigWarning::CommandWithoutParameters {
                command: name.clone(),
            });
        }
        if command.abort_on_error_while_parse && !command.throw_on_error_while_parse {
            warnings.push(ConfigWarning::AbortWithoutThrow {
                command: name.clone(),
            });
        }
        if command.output == OutputMode::None
            && (command.abort_on_error_while_parse || command.throw_on_error_while_parse)
        {
            warnings.push(ConfigWarning::PolicyWithoutOutput {
                command: name.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// Defaults merge field by field; command maps are combined and on name
/// collisions the overlay entry wins.
pub fn merge_configs(base: ExecutableConfig, overlay: ExecutableConfig) -> ExecutableConfig {
    let mut commands = base.commands;
    commands.extend(overlay.commands);
    let defaults = match (base.defaults, overlay.defaults) {
        (Some(b), Some(o)) => Some(DefaultsConfig {
            prefix: o.prefix.or(b.prefix),
            value_separator: o.value_separator.or(b.value_separator),
            space_encapsulation: o.space_encapsulation.or(b.space_encapsulation),
            parameter_separator: o.parameter_separator.or(b.parameter_separator),
        }),
        (b, o) => o.or(b),
    };
    ExecutableConfig {
        program: if overlay.program.is_empty() {
            base.program
        } else {
            overlay.program
        },
        defaults,
        commands,
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

impl ExecutableConfig {
    /// Validate and build an [`Executable`]. Warnings are logged.
    pub fn build(&self) -> Result<Executable, ConfigError> {
        for warning in validate_config(self)? {
            tracing::warn!(target: "cliwrap.config", %warning, "config warning");
        }

        let defaults = self
            .defaults
            .as_ref()
            .map(DefaultsConfig::to_command_defaults)
            .unwrap_or_default();
        let mut executable = Executable::with_defaults(&self.program, defaults);

        for (name, config) in &self.commands {
            let shape = config.parameters.iter().fold(Shape::new(), |shape, p| {
                let field = p.field.clone().unwrap_or_else(|| p.name.clone());
                shape.field(field, p.declared_type(), p.bindings())
            });
            let command = executable.add(name);
            command
                .set_throw_on_error_while_parse(config.throw_on_error_while_parse)
                .set_abort_on_error_while_parse(config.abort_on_error_while_parse)
                .set_cache_mappings(config.cache_mappings);
            if let Some(processor) = config.output.processor() {
                command.set_processor(processor);
            }
            command
                .add_shape(&shape)
                .map_err(|e| ConfigError::BuildError {
                    command: name.clone(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(
                target: "cliwrap.config",
                command = %name,
                slots = command.slots().len(),
                "command built"
            );
        }
        Ok(executable)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
