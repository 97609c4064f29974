// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value parameters and switches.

use serde_json::Value;

use crate::command::CommandDefaults;
use crate::naming::{fallback_prefix, infer_name};
use crate::value::{ParamType, render};

/// A named, typed value argument such as `-n 4` or `--out=file`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    ty: ParamType,
    prefix: String,
    value_separator: String,
    default: Value,
    space_encapsulation: String,
    hide_name: bool,
    priority: i32,
}

impl Parameter {
    /// Create a parameter from a terse name (see
    /// [`infer_name`](crate::infer_name)) with no command defaults.
    pub fn new(name: &str) -> Self {
        Self::with_defaults(name, &CommandDefaults::default())
    }

    /// Create a parameter, filling what the name does not specify from
    /// `defaults`.
    pub fn with_defaults(name: &str, defaults: &CommandDefaults) -> Self {
        let inferred = infer_name(name);
        let prefix = inferred
            .prefix
            .or_else(|| defaults.prefix.clone())
            .unwrap_or_else(|| fallback_prefix(&inferred.name).to_string());
        let value_separator = inferred
            .separator
            .or_else(|| defaults.value_separator.clone())
            .unwrap_or_else(|| " ".to_string());
        let space_encapsulation = defaults
            .space_encapsulation
            .clone()
            .unwrap_or_else(|| "\"".to_string());
        Self {
            name: inferred.name,
            ty: ParamType::Any,
            prefix,
            value_separator,
            default: Value::Null,
            space_encapsulation,
            hide_name: false,
            priority: 0,
        }
    }

    /// Replace the name verbatim (no inference).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the declared type.
    #[must_use]
    pub fn with_type(mut self, ty: ParamType) -> Self {
        self.ty = ty;
        self
    }

    /// Set the emission priority (lower first).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the separator between name and value.
    #[must_use]
    pub fn with_value_separator(mut self, separator: impl Into<String>) -> Self {
        self.value_separator = separator.into();
        self
    }

    /// Set the value used when the supplied one is zero.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Emit only the value, without prefix, name or separator.
    #[must_use]
    pub fn with_hide_name(mut self, hide_name: bool) -> Self {
        self.hide_name = hide_name;
        self
    }

    /// Set the quote wrapped around values that contain whitespace.
    #[must_use]
    pub fn with_space_encapsulation(mut self, quote: impl Into<String>) -> Self {
        self.space_encapsulation = quote.into();
        self
    }

    /// Bare name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    /// Prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Value separator.
    pub fn value_separator(&self) -> &str {
        &self.value_separator
    }

    /// Default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whitespace quote.
    pub fn space_encapsulation(&self) -> &str {
        &self.space_encapsulation
    }

    /// Returns `true` if only the value is emitted.
    pub fn hide_name(&self) -> bool {
        self.hide_name
    }

    /// Emission priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Format the argument for `value`, or `None` to omit it.
    ///
    /// A value of the wrong kind is omitted. A zero value is replaced by
    /// the default, and omitted if the default is zero too.
    pub fn format(&self, value: Option<&Value>) -> Option<String> {
        let value = value.unwrap_or(&Value::Null);
        if !self.ty.accepts(value) {
            tracing::debug!(
                target: "cliwrap.args",
                parameter = %self.name,
                expected = %self.ty,
                "omitting value of mismatched type"
            );
            return None;
        }
        let value = if self.ty.is_zero(value) {
            &self.default
        } else {
            value
        };
        if self.ty.is_zero(value) {
            return None;
        }
        let text = encapsulate(&render(value), &self.space_encapsulation);
        if self.hide_name {
            return Some(text);
        }
        Some(format!(
            "{}{}{}{}",
            self.prefix, self.name, self.value_separator, text
        ))
    }
}

/// Make `text` survive POSIX shell-word splitting unchanged.
///
/// Text containing whitespace is wrapped in `quote`; quote characters,
/// backslashes and `#` are escaped for the quoting style in effect.
fn encapsulate(text: &str, quote: &str) -> String {
    if !text.chars().any(char::is_whitespace) {
        return escape(text, &['\'', '"', '\\', '#']);
    }
    match quote {
        "\"" => format!("\"{}\"", escape(text, &['"', '\\'])),
        "'" => format!("'{}'", text.replace('\'', r"'\''")),
        q => format!("{q}{}{q}", escape(text, &['\'', '"', '\\'])),
    }
}

fn escape(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A presence flag such as `-v`: emitted when true, omitted when false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    name: String,
    prefix: String,
    default: bool,
    priority: i32,
}

impl Switch {
    /// Create a switch from a terse name with no command defaults.
    pub fn new(name: &str) -> Self {
        Self::with_defaults(name, &CommandDefaults::default())
    }

    /// Create a switch, taking the prefix from `defaults` when the name
    /// carries none.
    pub fn with_defaults(name: &str, defaults: &CommandDefaults) -> Self {
        let inferred = infer_name(name);
        let prefix = inferred
            .prefix
            .or_else(|| defaults.prefix.clone())
            .unwrap_or_else(|| fallback_prefix(&inferred.name).to_string());
        Self {
            name: inferred.name,
            prefix,
            default: false,
            priority: 0,
        }
    }

    /// Replace the name verbatim.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the emission priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the state used when no value is supplied.
    #[must_use]
    pub fn with_default(mut self, default: bool) -> Self {
        self.default = default;
        self
    }

    /// Bare name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// State used when no value is supplied.
    pub fn default_value(&self) -> bool {
        self.default
    }

    /// Emission priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Format the flag for `value`, or `None` to omit it.
    ///
    /// An absent or `null` value takes the default. An explicit `false`
    /// is kept, so a default-on switch can be turned off. Non-boolean
    /// values count as `false`.
    pub fn format(&self, value: Option<&Value>) -> Option<String> {
        let on = match value {
            None | Some(Value::Null) => self.default,
            Some(Value::Bool(b)) => *b,
            Some(_) => false,
        };
        on.then(|| format!("{}{}", self.prefix, self.name))
    }
}

/// One slot of a [`Command`](crate::Command).
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A value parameter.
    Value(Parameter),
    /// A switch.
    Switch(Switch),
}

impl Slot {
    /// Slot name.
    pub fn name(&self) -> &str {
        match self {
            Self::Value(p) => p.name(),
            Self::Switch(s) => s.name(),
        }
    }

    /// Emission priority.
    pub fn priority(&self) -> i32 {
        match self {
            Self::Value(p) => p.priority(),
            Self::Switch(s) => s.priority(),
        }
    }

    /// Format the slot for `value`, or `None` to omit it.
    pub fn format(&self, value: Option<&Value>) -> Option<String> {
        match self {
            Self::Value(p) => p.format(value),
            Self::Switch(s) => s.format(value),
        }
    }
}

impl From<Parameter> for Slot {
    fn from(p: Parameter) -> Self {
        Self::Value(p)
    }
}

impl From<Switch> for Slot {
    fn from(s: Switch) -> Self {
        Self::Switch(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terse_name_sets_prefix_and_separator() {
        let p = Parameter::new("w:");
        assert_eq!(p.name(), "w");
        assert_eq!(p.prefix(), "-");
        assert_eq!(p.value_separator(), ":");
        assert_eq!(p.format(Some(&json!(10))).as_deref(), Some("-w:10"));
    }

    #[test]
    fn long_names_default_to_double_dash() {
        let p = Parameter::new("count");
        assert_eq!(p.format(Some(&json!(3))).as_deref(), Some("--count 3"));
    }

    #[test]
    fn command_defaults_fill_gaps_but_name_wins() {
        let defaults = CommandDefaults {
            prefix: Some("/".into()),
            value_separator: Some("=".into()),
            space_encapsulation: Some("'".into()),
            ..CommandDefaults::default()
        };
        let p = Parameter::with_defaults("out", &defaults);
        assert_eq!(p.format(Some(&json!("a b"))).as_deref(), Some("/out='a b'"));
        let q = Parameter::with_defaults("-o:", &defaults);
        assert_eq!(q.format(Some(&json!("x"))).as_deref(), Some("-o:x"));
    }

    #[test]
    fn optional_integer_without_default_is_omitted_when_absent() {
        let n = Parameter::new("n").with_type(ParamType::Integer.optional());
        assert_eq!(n.format(None), None);
        assert_eq!(n.format(Some(&json!(2))).as_deref(), Some("-n 2"));
        assert_eq!(n.format(Some(&json!(0))).as_deref(), Some("-n 0"));
    }

    #[test]
    fn zero_takes_default_then_omits() {
        let c = Parameter::new("c").with_type(ParamType::Float).with_default(5.0);
        assert_eq!(c.format(None).as_deref(), Some("-c 5"));
        assert_eq!(c.format(Some(&json!(0.0))).as_deref(), Some("-c 5"));
        assert_eq!(c.format(Some(&json!(6.0))).as_deref(), Some("-c 6"));

        let b = Parameter::new("b").with_type(ParamType::Integer);
        assert_eq!(b.format(Some(&json!(0))), None);
    }

    #[test]
    fn mismatched_kind_is_omitted_even_with_default() {
        let b = Parameter::new("b").with_type(ParamType::Integer).with_default(7);
        assert_eq!(b.format(Some(&json!(true))), None);
        assert_eq!(b.format(Some(&json!(null))).as_deref(), Some("-b 7"));
    }

    #[test]
    fn whitespace_is_encapsulated_and_hide_name_emits_value_only() {
        let p = Parameter::new("host")
            .with_hide_name(true)
            .with_space_encapsulation("'");
        assert_eq!(p.format(Some(&json!("a\tb"))).as_deref(), Some("'a\tb'"));
        assert_eq!(p.format(Some(&json!("plain"))).as_deref(), Some("plain"));
    }

    #[test]
    fn quotes_backslashes_and_hashes_are_escaped() {
        let p = Parameter::new("v").with_hide_name(true);
        assert_eq!(p.format(Some(&json!("don't"))).as_deref(), Some(r"don\'t"));
        assert_eq!(p.format(Some(&json!(r"C:\temp\x"))).as_deref(), Some(r"C:\\temp\\x"));
        assert_eq!(p.format(Some(&json!("#1"))).as_deref(), Some(r"\#1"));
        assert_eq!(
            p.format(Some(&json!(r#"say "hi" \o/"#))).as_deref(),
            Some(r#""say \"hi\" \\o/""#)
        );

        let single = p.clone().with_space_encapsulation("'");
        assert_eq!(
            single.format(Some(&json!("it's here"))).as_deref(),
            Some(r"'it'\''s here'")
        );
    }

    #[test]
    fn builders_override_inferred_parts() {
        let p = Parameter::new("x")
            .with_name("xx")
            .with_prefix("+")
            .with_value_separator("~")
            .with_priority(-1);
        assert_eq!(p.priority(), -1);
        assert_eq!(p.format(Some(&json!("v"))).as_deref(), Some("+xx~v"));
    }

    #[test]
    fn switch_defaults_apply_only_to_absent_input() {
        let c = Switch::new("c").with_default(true);
        assert_eq!(c.format(None).as_deref(), Some("-c"));
        assert_eq!(c.format(Some(&Value::Null)).as_deref(), Some("-c"));
        assert_eq!(c.format(Some(&json!(false))), None);
        assert_eq!(c.format(Some(&json!("yes"))), None);

        let v = Switch::new("--verbose");
        assert_eq!(v.format(Some(&json!(true))).as_deref(), Some("--verbose"));
        assert_eq!(v.format(None), None);
    }

    #[test]
    fn slot_dispatches_to_its_kind() {
        let slot: Slot = Switch::new("q").with_priority(3).into();
        assert_eq!(slot.name(), "q");
        assert_eq!(slot.priority(), 3);
        assert_eq!(slot.format(Some(&json!(true))).as_deref(), Some("-q"));
    }
}
