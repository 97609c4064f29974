// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prefix and value-separator inference from terse slot names.

/// Recognised prefixes, longest first.
const PREFIXES: [&str; 3] = ["--", "-", "/"];
/// Recognised value separators.
const SEPARATORS: [&str; 3] = [" ", ":", "="];

/// A slot name split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredName {
    /// Bare name.
    pub name: String,
    /// Prefix found at the front, if any.
    pub prefix: Option<String>,
    /// Value separator found at the end, if any.
    pub separator: Option<String>,
}

/// Split a terse name such as `"--out="` or `"w:"` into name, prefix and
/// value separator.
///
/// At most one prefix and one separator are stripped.
///
/// ```
/// use cliwrap_args::infer_name;
///
/// let n = infer_name("w:");
/// assert_eq!(n.name, "w");
/// assert_eq!(n.prefix, None);
/// assert_eq!(n.separator.as_deref(), Some(":"));
///
/// let n = infer_name("--out=");
/// assert_eq!((n.prefix.as_deref(), n.name.as_str()), (Some("--"), "out"));
/// ```
pub fn infer_name(raw: &str) -> InferredName {
    let (prefix, rest) = PREFIXES
        .iter()
        .find_map(|p| raw.strip_prefix(*p).map(|rest| (Some(*p), rest)))
        .unwrap_or((None, raw));
    let (separator, name) = SEPARATORS
        .iter()
        .find_map(|s| rest.strip_suffix(*s).map(|name| (Some(*s), name)))
        .unwrap_or((None, rest));
    InferredName {
        name: name.to_string(),
        prefix: prefix.map(str::to_string),
        separator: separator.map(str::to_string),
    }
}

/// Prefix used when neither the name nor the command supplies one.
pub(crate) fn fallback_prefix(name: &str) -> &'static str {
    if name.chars().count() > 1 { "--" } else { "-" }
}
