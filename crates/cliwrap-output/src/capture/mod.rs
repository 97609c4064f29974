// SPDX-License-Identifier: MIT OR Apache-2.0
//! Capture-and-convert processor.
//!
//! A [`CaptureProcessor`] holds an ordered list of rules, each a pattern
//! with named groups and a target type. Every line is scanned repeatedly:
//! the first rule (in registration order) that matches anywhere in the
//! remaining text wins, its match is converted into the target type, and
//! the matched span is cut out before the next scan. Scanning stops when
//! no rule matches.
//!
//! Conversion is layered. A whole-object override registered for the
//! target type is used first, then a group-mapping override, and finally
//! the target's serde `Deserialize` implementation is driven from the
//! groups (see [`CaptureProcessor::add_rule`]).

mod convert;
mod de;
mod groups;

pub use groups::GroupMap;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex, RwLock};

use regex::{Captures, Regex};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{ExecutionContext, OutputProcessor, ParsedObject, ProcessorError, Stream};
use convert::{FieldConverters, ObjectConverters, ObjectFn};

type BuildFn =
    dyn Fn(&GroupMap, &FieldConverters) -> Result<ParsedObject, ProcessorError> + Send + Sync;

struct Rule {
    pattern: Regex,
    target: TypeId,
    target_name: &'static str,
    build: Option<Arc<BuildFn>>,
}

#[derive(Clone)]
enum Conversion {
    Override(Arc<ObjectFn>),
    Deserialize(Arc<BuildFn>),
}

/// Converts named regex captures into typed values.
///
/// Per-stream continuation buffers are keyed by execution, so one instance
/// may back several concurrent executions.
#[derive(Default)]
pub struct CaptureProcessor {
    rules: Vec<Rule>,
    objects: ObjectConverters,
    constructors: ObjectConverters,
    fields: FieldConverters,
    throw_on_stderr: bool,
    throw_on_no_match: bool,
    continuous: bool,
    caching: bool,
    buffers: Mutex<HashMap<(Uuid, Stream), String>>,
    resolved: RwLock<HashMap<TypeId, Conversion>>,
}

impl CaptureProcessor {
    /// Create a processor with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule producing `T` from matches of `pattern`.
    ///
    /// Unless an override is registered for `T`, the value is built with
    /// `T`'s `Deserialize` implementation:
    ///
    /// - a struct reads each field from the group of the same (serde) name;
    ///   fields without a group, or whose group captured nothing, get the
    ///   zero value (`0`, `false`, `""`, `None`, empty `Vec`);
    /// - scalar fields parse the last capture of their group, sequence
    ///   fields take every capture;
    /// - a field whose type has a converter registered through
    ///   [`add_field_mapping`](Self::add_field_mapping) uses it when its
    ///   group captured something;
    /// - any other target (`String`, numbers, tuples) reads the whole
    ///   matched text, and map targets receive every group.
    pub fn add_rule<T>(self, pattern: &str) -> Result<Self, ProcessorError>
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        Ok(self.with_rule::<T>(Regex::new(pattern)?))
    }

    /// [`add_rule`](Self::add_rule) with a compiled pattern.
    #[must_use]
    pub fn with_rule<T>(mut self, pattern: Regex) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let build = |groups: &GroupMap, fields: &FieldConverters| {
            de::from_groups::<T>(groups, fields)
                .map(ParsedObject::new)
                .map_err(|e| ProcessorError::conversion::<T>(e))
        };
        self.rules.push(Rule {
            pattern,
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            build: Some(Arc::new(build)),
        });
        self
    }

    /// Add a rule that emits the [`GroupMap`] of each match.
    pub fn add_group_rule(mut self, pattern: &str) -> Result<Self, ProcessorError> {
        let build = |groups: &GroupMap, _: &FieldConverters| -> Result<ParsedObject, ProcessorError> {
            Ok(ParsedObject::new(groups.clone()))
        };
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            target: TypeId::of::<GroupMap>(),
            target_name: std::any::type_name::<GroupMap>(),
            build: Some(Arc::new(build)),
        });
        Ok(self)
    }

    /// Add a rule whose matches are converted by `convert` alone.
    ///
    /// `T` needs no `Deserialize` implementation; `convert` is registered
    /// as the whole-object override for `T`.
    pub fn add_mapped_rule<T, E, F>(mut self, pattern: &str, convert: F) -> Result<Self, ProcessorError>
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&Captures<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            pattern: Regex::new(pattern)?,
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            build: None,
        });
        Ok(self.add_object_mapping(convert))
    }

    /// Override conversion of `T` with a function of the raw match.
    #[must_use]
    pub fn add_object_mapping<T, E, F>(mut self, convert: F) -> Self
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&Captures<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.objects.insert_match(convert);
        self
    }

    /// Override conversion of `T` with a function of the group mapping.
    ///
    /// Used when no raw-match override is registered for `T`.
    #[must_use]
    pub fn add_constructor_mapping<T, E, F>(mut self, convert: F) -> Self
    where
        T: Any + Send + Sync,
        E: Display,
        F: Fn(&GroupMap) -> Result<T, E> + Send + Sync + 'static,
    {
        self.constructors.insert_groups(convert);
        self
    }

    /// Convert fields whose serde type name is `type_name` (`"Duration"`,
    /// a newtype's name, or a primitive such as `"u32"`) with `convert`,
    /// which receives the group's last capture.
    ///
    /// An empty capture never reaches `convert`: `Option` fields become
    /// `None` and other fields get `T::default()`.
    #[must_use]
    pub fn add_field_mapping<T, E, F>(mut self, type_name: &str, convert: F) -> Self
    where
        T: Serialize + Default,
        E: Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        self.fields.insert_scalar(type_name, convert);
        self
    }

    /// Like [`add_field_mapping`](Self::add_field_mapping), but `convert`
    /// receives every capture of the group.
    #[must_use]
    pub fn add_field_array_mapping<T, E, F>(mut self, type_name: &str, convert: F) -> Self
    where
        T: Serialize + Default,
        E: Display,
        F: Fn(&[String]) -> Result<T, E> + Send + Sync + 'static,
    {
        self.fields.insert_array(type_name, convert);
        self
    }

    /// Raise [`ProcessorError::StderrReceived`] for every non-empty stderr line.
    #[must_use]
    pub fn with_throw_on_stderr(mut self, throw: bool) -> Self {
        self.throw_on_stderr = throw;
        self
    }

    /// Raise [`ProcessorError::NoMatch`] when no rule matches a line.
    #[must_use]
    pub fn with_throw_on_no_match(mut self, throw: bool) -> Self {
        self.throw_on_no_match = throw;
        self
    }

    /// Keep unmatched text and prefix it (plus `\n`) to the next line of
    /// the same stream, so one record may span several lines.
    ///
    /// Text still buffered when the execution ends is an incomplete record
    /// and is dropped. Text left over from a line whose conversion failed
    /// is not buffered.
    #[must_use]
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Remember the conversion chosen for each target type.
    #[must_use]
    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    /// Number of rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn resolve(&self, rule: &Rule) -> Option<Conversion> {
        if self.caching {
            let cache = self.resolved.read().expect("conversion cache lock poisoned");
            if let Some(found) = cache.get(&rule.target) {
                return Some(found.clone());
            }
        }
        let found = self
            .objects
            .get(rule.target)
            .or_else(|| self.constructors.get(rule.target))
            .cloned()
            .map(Conversion::Override)
            .or_else(|| rule.build.clone().map(Conversion::Deserialize))?;
        if self.caching {
            tracing::debug!(target: "cliwrap.output", target_type = rule.target_name, "caching conversion");
            self.resolved
                .write()
                .expect("conversion cache lock poisoned")
                .entry(rule.target)
                .or_insert_with(|| found.clone());
        }
        Some(found)
    }

    fn convert(&self, rule: &Rule, caps: &Captures<'_>) -> Result<ParsedObject, ProcessorError> {
        let groups = GroupMap::from_captures(&rule.pattern, caps);
        match self.resolve(rule) {
            Some(Conversion::Override(convert)) => convert(caps, &groups),
            Some(Conversion::Deserialize(build)) => build(&groups, &self.fields),
            None => Err(ProcessorError::Conversion {
                target: rule.target_name,
                reason: "no conversion registered".into(),
            }),
        }
    }

    fn scan(
        &self,
        ctx: &ExecutionContext,
        line: &str,
        stream: Stream,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        let mut text = if self.continuous {
            let pending = self
                .buffers
                .lock()
                .expect("capture buffer lock poisoned")
                .remove(&(ctx.id(), stream));
            match pending {
                Some(pending) => format!("{pending}\n{line}"),
                None => line.to_string(),
            }
        } else {
            line.to_string()
        };
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let mut matched = false;
        while !text.is_empty() {
            let Some((rule, caps)) = self
                .rules
                .iter()
                .find_map(|rule| rule.pattern.captures(&text).map(|caps| (rule, caps)))
            else {
                break;
            };
            matched = true;
            let span = caps.get(0).map(|m| m.range()).unwrap_or_default();
            let converted = self.convert(rule, &caps);
            drop(caps);
            match converted {
                Ok(object) => out.push(object),
                // the rest of a failed line is not kept for the next one
                Err(e) => return Err(e.with_objects(out)),
            }
            // an empty match cannot shrink the text
            if span.is_empty() {
                break;
            }
            text.replace_range(span, "");
        }

        if self.continuous {
            let rest = text.trim_matches(['\r', '\n']);
            if !rest.is_empty() {
                self.buffers
                    .lock()
                    .expect("capture buffer lock poisoned")
                    .insert((ctx.id(), stream), rest.to_string());
            }
        }
        if !matched {
            tracing::trace!(target: "cliwrap.output", %stream, text = %text, "no rule matched");
            if self.throw_on_no_match {
                return Err(ProcessorError::NoMatch { stream, text });
            }
        }
        Ok(out)
    }

    fn clear(&self, ctx: &ExecutionContext) {
        self.buffers
            .lock()
            .expect("capture buffer lock poisoned")
            .retain(|(id, _), _| *id != ctx.id());
    }
}

impl OutputProcessor for CaptureProcessor {
    fn parse_output(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        self.scan(ctx, line, Stream::Stdout)
    }

    fn parse_error(
        &self,
        ctx: &ExecutionContext,
        line: &str,
    ) -> Result<Vec<ParsedObject>, ProcessorError> {
        if self.throw_on_stderr && !line.is_empty() {
            return Err(ProcessorError::StderrReceived {
                line: line.to_string(),
            });
        }
        self.scan(ctx, line, Stream::Stderr)
    }

    fn pre_started(&self, ctx: &ExecutionContext) {
        self.clear(ctx);
    }

    /// Drops any partial record still buffered for `ctx`.
    fn ended(&self, ctx: &ExecutionContext) -> Result<Vec<ParsedObject>, ProcessorError> {
        self.clear(ctx);
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Duration;

    const PING: &str = r"(?:Reply from (?<ip>[^:]+): )?(?:bytes=(?<bytes>\d+) time[=<](?<time>\S+) TTL=(?<ttl>\d+)|(?<fail>.+))";

    #[derive(Debug, Clone, Deserialize, PartialEq)]
    struct PingReply {
        ip: String,
        bytes: u32,
        time: Option<Duration>,
        ttl: u8,
        fail: String,
    }

    fn millis(text: &str) -> Result<Duration, std::num::ParseIntError> {
        text.trim_end_matches("ms").parse().map(Duration::from_millis)
    }

    fn ping_processor() -> CaptureProcessor {
        CaptureProcessor::new()
            .add_rule::<PingReply>(PING)
            .unwrap()
            .add_field_mapping("Duration", millis)
    }

    fn replies(objects: Vec<ParsedObject>) -> Vec<PingReply> {
        objects
            .into_iter()
            .map(|o| o.downcast::<PingReply>().unwrap())
            .collect()
    }

    #[test]
    fn reply_line_fills_every_field() {
        let p = ping_processor();
        let ctx = ExecutionContext::new("ping", "");
        let out = replies(
            p.parse_output(&ctx, "Reply from 127.0.0.1: bytes=32 time=10ms TTL=64")
                .unwrap(),
        );
        assert_eq!(
            out,
            [PingReply {
                ip: "127.0.0.1".into(),
                bytes: 32,
                time: Some(Duration::from_millis(10)),
                ttl: 64,
                fail: String::new(),
            }]
        );
    }

    #[test]
    fn failure_line_leaves_other_fields_at_zero() {
        let p = ping_processor();
        let ctx = ExecutionContext::new("ping", "");
        let out = replies(p.parse_output(&ctx, "Request timed out.").unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].fail, "Request timed out.");
        assert_eq!(out[0].ip, "");
        assert_eq!(out[0].bytes, 0);
        assert_eq!(out[0].time, None);
    }

    #[test]
    fn repeated_runs_are_identical_with_and_without_caching() {
        let text = "Reply from 10.0.0.1: bytes=32 time<1ms TTL=128";
        let ctx = ExecutionContext::new("ping", "");
        let plain = ping_processor();
        let cached = ping_processor().with_caching(true);
        let first = replies(plain.parse_output(&ctx, text).unwrap());
        assert_eq!(first, replies(plain.parse_output(&ctx, text).unwrap()));
        assert_eq!(first, replies(cached.parse_output(&ctx, text).unwrap()));
        assert_eq!(first, replies(cached.parse_output(&ctx, text).unwrap()));
    }

    #[test]
    fn scan_consumes_matches_left_to_right_without_overlap() {
        let p = CaptureProcessor::new().add_rule::<u32>(r"\d+").unwrap();
        let ctx = ExecutionContext::new("prog", "");
        let out: Vec<u32> = p
            .parse_output(&ctx, "a1 b22 c333")
            .unwrap()
            .into_iter()
            .map(|o| o.downcast().unwrap())
            .collect();
        assert_eq!(out, [1, 22, 333]);
    }

    #[test]
    fn earlier_rules_take_precedence() {
        let p = CaptureProcessor::new()
            .add_rule::<String>(r"[a-z]+")
            .unwrap()
            .add_rule::<u32>(r"\d+")
            .unwrap();
        let ctx = ExecutionContext::new("prog", "");
        let out = p.parse_output(&ctx, "12 ab 34").unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].downcast_ref::<String>().unwrap(), "ab");
        assert_eq!(out[1].downcast_ref::<u32>(), Some(&12));
        assert_eq!(out[2].downcast_ref::<u32>(), Some(&34));
    }

    #[test]
    fn continuous_mode_joins_a_record_split_across_lines() {
        let pattern = r"(?<ip>[\d.]+): bytes=(?<bytes>\d+) time[=<](?<time>\S+) TTL=(?<ttl>\d+)";
        #[derive(Debug, Clone, Deserialize, PartialEq)]
        struct Hit {
            ip: String,
            bytes: u32,
            ttl: u8,
        }
        let p = CaptureProcessor::new()
            .add_rule::<Hit>(pattern)
            .unwrap()
            .with_continuous(true);
        let ctx = ExecutionContext::new("ping", "");
        assert!(p.parse_output(&ctx, "Reply fr").unwrap().is_empty());
        let out = p
            .parse_output(&ctx, "om 127.0.0.1: bytes=32 time=1ms TTL=1")
            .unwrap();
        assert_eq!(out.len(), 1);
        let whole = CaptureProcessor::new().add_rule::<Hit>(pattern).unwrap();
        let expected = whole
            .parse_output(&ctx, "Reply from 127.0.0.1: bytes=32 time=1ms TTL=1")
            .unwrap();
        assert_eq!(
            out[0].downcast_ref::<Hit>(),
            expected[0].downcast_ref::<Hit>()
        );
    }

    #[test]
    fn continuous_buffers_are_per_stream_and_per_execution() {
        let p = CaptureProcessor::new()
            .add_rule::<String>(r"a\nb")
            .unwrap()
            .with_continuous(true);
        let one = ExecutionContext::new("prog", "");
        let two = ExecutionContext::new("prog", "");
        p.parse_output(&one, "a").unwrap();
        p.parse_error(&one, "x").unwrap();
        p.parse_output(&two, "y").unwrap();
        let out = p.parse_output(&one, "b").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].downcast_ref::<String>().unwrap(), "a\nb");
        assert!(p.parse_output(&two, "b").unwrap().is_empty());
    }

    #[test]
    fn ended_discards_buffered_text() {
        let p = CaptureProcessor::new()
            .add_rule::<String>(r"a\nb")
            .unwrap()
            .with_continuous(true);
        let ctx = ExecutionContext::new("prog", "");
        p.parse_output(&ctx, "a").unwrap();
        assert!(p.ended(&ctx).unwrap().is_empty());
        assert!(p.parse_output(&ctx, "b").unwrap().is_empty());
    }

    #[test]
    fn no_match_raises_only_when_configured() {
        let ctx = ExecutionContext::new("prog", "");
        let lax = CaptureProcessor::new().add_rule::<u32>(r"\d+").unwrap();
        assert!(lax.parse_output(&ctx, "none").unwrap().is_empty());

        let strict = lax.with_throw_on_no_match(true);
        let err = strict.parse_output(&ctx, "none").unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::NoMatch { stream: Stream::Stdout, ref text } if text == "none"
        ));
        assert!(strict.parse_output(&ctx, "").unwrap().is_empty());
    }

    #[test]
    fn stderr_policy_rejects_non_empty_lines() {
        let p = ping_processor().with_throw_on_stderr(true);
        let ctx = ExecutionContext::new("ping", "");
        assert!(p.parse_error(&ctx, "").unwrap().is_empty());
        assert!(matches!(
            p.parse_error(&ctx, "ping: unknown host"),
            Err(ProcessorError::StderrReceived { .. })
        ));
    }

    #[test]
    fn failing_field_conversion_is_a_parse_error() {
        #[derive(Debug, Deserialize)]
        struct Timed {
            #[allow(dead_code)]
            time: Duration,
        }
        let p = CaptureProcessor::new()
            .add_rule::<Timed>(r"time=(?<time>\S+)")
            .unwrap()
            .add_field_mapping("Duration", millis);
        let ctx = ExecutionContext::new("prog", "");
        let err = p.parse_output(&ctx, "time=soon").unwrap_err();
        assert!(matches!(err, ProcessorError::Conversion { .. }), "{err}");
    }

    #[test]
    fn continuous_mode_recovers_after_a_failed_conversion() {
        #[derive(Debug, Deserialize)]
        struct Timed {
            time: Duration,
        }
        let p = CaptureProcessor::new()
            .add_rule::<Timed>(r"time=(?<time>\S+)")
            .unwrap()
            .add_field_mapping("Duration", millis)
            .with_continuous(true);
        let ctx = ExecutionContext::new("prog", "");
        assert!(p.parse_output(&ctx, "time=soon").is_err());
        let out = p.parse_output(&ctx, "time=5ms").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].downcast_ref::<Timed>().unwrap().time,
            Duration::from_millis(5)
        );
    }

    #[test]
    fn empty_capture_gives_a_mapped_field_its_default() {
        #[derive(Debug, Deserialize)]
        struct Reply {
            time: Duration,
            fail: String,
        }
        let p = CaptureProcessor::new()
            .add_rule::<Reply>(r"time=(?<time>\S+)|(?<fail>.+)")
            .unwrap()
            .add_field_mapping("Duration", millis);
        let ctx = ExecutionContext::new("prog", "");
        let out = p.parse_output(&ctx, "Request timed out.").unwrap();
        let reply = out[0].downcast_ref::<Reply>().unwrap();
        assert_eq!(reply.time, Duration::ZERO);
        assert_eq!(reply.fail, "Request timed out.");
    }

    #[test]
    fn objects_before_a_failed_conversion_are_kept() {
        #[derive(Debug, Deserialize)]
        struct N {
            n: u8,
        }
        let p = CaptureProcessor::new().add_rule::<N>(r"(?<n>\d+)").unwrap();
        let ctx = ExecutionContext::new("prog", "");
        let err = p.parse_output(&ctx, "1 2 999 4").unwrap_err();
        assert!(err.to_string().contains("999"), "{err}");
        let (objects, inner) = err.into_parts();
        let values: Vec<u8> = objects
            .iter()
            .map(|o| o.downcast_ref::<N>().unwrap().n)
            .collect();
        assert_eq!(values, [1, 2]);
        assert!(matches!(inner, ProcessorError::Conversion { .. }), "{inner}");
    }

    #[test]
    fn object_override_beats_constructor_override_beats_deserialize() {
        #[derive(Debug, Clone, Deserialize, PartialEq)]
        struct Word {
            w: String,
        }
        let ctx = ExecutionContext::new("prog", "");
        let base = || CaptureProcessor::new().add_rule::<Word>(r"(?<w>\w+)").unwrap();

        let plain = base().parse_output(&ctx, "hi").unwrap();
        assert_eq!(plain[0].downcast_ref::<Word>().unwrap().w, "hi");

        let ctor = base()
            .add_constructor_mapping(|g: &GroupMap| {
                Ok::<_, String>(Word {
                    w: g.last("w").unwrap_or_default().to_uppercase(),
                })
            })
            .parse_output(&ctx, "hi")
            .unwrap();
        assert_eq!(ctor[0].downcast_ref::<Word>().unwrap().w, "HI");

        let object = base()
            .add_constructor_mapping(|_: &GroupMap| Ok::<_, String>(Word { w: "ctor".into() }))
            .add_object_mapping(|c: &Captures<'_>| {
                Ok::<_, String>(Word {
                    w: format!("<{}>", &c["w"]),
                })
            })
            .parse_output(&ctx, "hi")
            .unwrap();
        assert_eq!(object[0].downcast_ref::<Word>().unwrap().w, "<hi>");
    }

    #[test]
    fn mapped_and_group_rules() {
        struct Opaque(usize);
        let p = CaptureProcessor::new()
            .add_mapped_rule(r"#+", |c: &Captures<'_>| Ok::<_, String>(Opaque(c[0].len())))
            .unwrap()
            .add_group_rule(r"(?<key>\w+)=(?<value>\w*)")
            .unwrap();
        let ctx = ExecutionContext::new("prog", "");
        let out = p.parse_output(&ctx, "### k=").unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].downcast_ref::<Opaque>().unwrap().0, 3);
        let groups = out[1].downcast_ref::<GroupMap>().unwrap();
        assert_eq!(groups.last("key"), Some("k"));
        assert_eq!(groups.last("value"), Some(""));
    }

    #[test]
    fn array_mapping_receives_all_captures() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Count(usize);
        #[derive(Debug, Deserialize)]
        struct Line {
            n: Count,
        }
        let p = CaptureProcessor::new()
            .add_rule::<Line>(r"(?<n>x+)")
            .unwrap()
            .add_field_array_mapping("Count", |caps: &[String]| {
                Ok::<_, String>(caps.iter().map(String::len).sum::<usize>())
            });
        let ctx = ExecutionContext::new("prog", "");
        let out = p.parse_output(&ctx, "xxx").unwrap();
        assert_eq!(out[0].downcast_ref::<Line>().unwrap().n, Count(3));
    }

    #[test]
    fn invalid_pattern_fails_at_configuration_time() {
        assert!(matches!(
            CaptureProcessor::new().add_rule::<String>("(?<x>"),
            Err(ProcessorError::Pattern(_))
        ));
    }
}
