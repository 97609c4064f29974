// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests for argument construction.

use cliwrap_args::{
    ArgsError, ArgumentShape, Binding, Command, CommandDefaults, ParamType, Parameter, Shape,
};
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// 1. Input shapes
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PingArgs {
    count: Option<u32>,
    host: String,
}

impl ArgumentShape for PingArgs {
    fn shape() -> Shape {
        Shape::new()
            .field(
                "count",
                ParamType::Integer.optional(),
                [Binding::Name("n".into())],
            )
            .field("host", ParamType::Text, [Binding::HideName])
    }
}

fn ping_command() -> Command {
    let mut cmd = Command::new("ping");
    cmd.add_shape_of::<PingArgs>().unwrap();
    cmd
}

#[test]
fn four_input_shapes_produce_the_same_arguments() {
    let cmd = ping_command();
    let typed = cmd
        .construct_arguments_from(&PingArgs {
            count: Some(2),
            host: "localhost".into(),
        })
        .unwrap();
    let positional = cmd.construct_arguments(&json!([2, "localhost"])).unwrap();
    let anonymous = cmd
        .construct_arguments(&json!({"count": 2, "host": "localhost"}))
        .unwrap();
    let mut explicit = serde_json::Map::new();
    explicit.insert("n".into(), json!(2));
    explicit.insert("host".into(), json!("localhost"));
    let mapping = cmd.construct_arguments(&Value::Object(explicit)).unwrap();

    assert_eq!(typed, "-n 2 localhost");
    assert_eq!(positional, typed);
    assert_eq!(anonymous, typed);
    assert_eq!(mapping, typed);
}

#[test]
fn slot_name_wins_over_field_name() {
    let cmd = ping_command();
    let out = cmd
        .construct_arguments(&json!({"n": 1, "count": 9, "host": "h"}))
        .unwrap();
    assert_eq!(out, "-n 1 h");
}

#[test]
fn surplus_positional_values_are_ignored() {
    let cmd = ping_command();
    assert_eq!(
        cmd.construct_arguments(&json!([null, "h", "extra"])).unwrap(),
        "h"
    );
}

// ---------------------------------------------------------------------------
// 2. Shape reuse
// ---------------------------------------------------------------------------

#[test]
fn binding_a_second_field_to_a_declared_slot_reuses_it() {
    let mut cmd = Command::new("tool");
    cmd.add_parameter("out", ParamType::Text, Value::Null).unwrap();
    let shape = Shape::new().field("output", ParamType::Text, [Binding::Name("out".into())]);
    cmd.add_shape(&shape).unwrap();

    assert_eq!(cmd.slots().len(), 1);
    let mappings: Vec<_> = cmd.mappings().collect();
    assert_eq!(mappings, [("out", "out"), ("output", "out")]);
    assert_eq!(
        cmd.construct_arguments(&json!({"output": "f.txt"})).unwrap(),
        "--out f.txt"
    );
}

#[test]
fn shape_slots_inherit_command_defaults() {
    let defaults = CommandDefaults {
        prefix: Some("/".into()),
        value_separator: Some(":".into()),
        ..CommandDefaults::default()
    };
    let mut cmd = Command::with_defaults("win", defaults);
    cmd.add_shape(&Shape::new().field("w", ParamType::Integer, []))
        .unwrap();
    assert_eq!(cmd.construct_arguments(&json!({"w": 500})).unwrap(), "/w:500");
}

#[test]
fn unnamed_binding_fails_immediately() {
    let mut cmd = Command::new("tool");
    let shape = Shape::new().field("x", ParamType::Any, [Binding::Name("--".into())]);
    assert!(matches!(
        cmd.add_shape(&shape),
        Err(ArgsError::UnnamedParameter { .. })
    ));
}

// ---------------------------------------------------------------------------
// 3. Ordering and omission properties
// ---------------------------------------------------------------------------

fn arb_priorities() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-3i32..3, 1..8)
}

proptest! {
    /// Tokens appear in ascending priority, ties in declaration order,
    /// whatever order the input fields arrive in.
    #[test]
    fn tokens_follow_priority_then_declaration(priorities in arb_priorities(), reverse in any::<bool>()) {
        let mut cmd = Command::new("p");
        for (i, prio) in priorities.iter().enumerate() {
            let switch = cmd.new_switch(&format!("s{i}")).with_priority(*prio);
            cmd.add(switch).unwrap();
        }
        let mut keys: Vec<usize> = (0..priorities.len()).collect();
        if reverse {
            keys.reverse();
        }
        let input: serde_json::Map<String, Value> =
            keys.iter().map(|i| (format!("s{i}"), json!(true))).collect();
        let out = cmd.construct_arguments(&Value::Object(input)).unwrap();

        let mut expected: Vec<usize> = (0..priorities.len()).collect();
        expected.sort_by_key(|&i| priorities[i]);
        let expected: Vec<String> = expected.iter().map(|i| format!("--s{i}")).collect();
        prop_assert_eq!(out, expected.join(" "));
    }

    /// A value parameter is omitted exactly when both the value and the
    /// default are zero.
    #[test]
    fn omitted_iff_value_and_default_are_zero(value in -2i64..3, default in -2i64..3) {
        let p = Parameter::new("n").with_type(ParamType::Integer).with_default(default);
        let out = p.format(Some(&json!(value)));
        prop_assert_eq!(out.is_none(), value == 0 && default == 0);
        if value != 0 {
            prop_assert_eq!(out, Some(format!("-n {value}")));
        }
    }

    /// A hidden-name text value splits back into exactly one shell word,
    /// unchanged, under either quote style.
    #[test]
    fn text_values_survive_shell_word_splitting(
        value in "[ -~\t]{1,16}",
        single in any::<bool>(),
    ) {
        let quote = if single { "'" } else { "\"" };
        let p = Parameter::new("v")
            .with_type(ParamType::Text)
            .with_hide_name(true)
            .with_space_encapsulation(quote);
        let rendered = p.format(Some(&json!(value))).unwrap();
        prop_assert_eq!(shell_words::split(&rendered).unwrap(), vec![value]);
    }
}
