// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named-group view of a single pattern match.

use std::collections::BTreeMap;

use regex::{Captures, Regex};

/// Mapping from capture-group name to the strings it captured, plus the
/// whole matched text.
///
/// Every named group of the pattern is present. A group that did not take
/// part in the match maps to an empty list. The `regex` engine records only
/// the final iteration of a repeated group, so a list holds at most one
/// entry for matches produced by this crate; hand-built maps may hold more.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMap {
    text: String,
    groups: BTreeMap<String, Vec<String>>,
}

impl GroupMap {
    /// Build the map for `caps`, a match of `pattern`.
    pub fn from_captures(pattern: &Regex, caps: &Captures<'_>) -> Self {
        let groups = pattern
            .capture_names()
            .flatten()
            .map(|name| {
                let values = caps
                    .name(name)
                    .map(|m| vec![m.as_str().to_string()])
                    .unwrap_or_default();
                (name.to_string(), values)
            })
            .collect();
        Self {
            text: caps
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            groups,
        }
    }

    /// Build a map by hand.
    pub fn from_parts(
        text: impl Into<String>,
        groups: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        Self {
            text: text.into(),
            groups: groups.into_iter().collect(),
        }
    }

    /// The whole matched text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every capture of group `name`, or an empty slice.
    pub fn get(&self, name: &str) -> &[String] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The last capture of group `name`, if it captured anything.
    pub fn last(&self, name: &str) -> Option<&str> {
        self.get(name).last().map(String::as_str)
    }

    /// Returns `true` if the pattern declares a group called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Group names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Iterate over `(name, captures)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub(crate) fn whole(&self) -> &[String] {
        std::slice::from_ref(&self.text)
    }
}
