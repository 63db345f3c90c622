//! Argument formatting
//!
//! Turns a logging call's argument list into one display string, following
//! the usual multi-argument console convention:
//! - a leading string with `%s %d %i %f %o` placeholders takes the following
//!   arguments positionally; leftovers are appended space-joined
//! - otherwise every argument is stringified and space-joined
//!
//! Structured values print as pretty JSON collapsed onto one line, with
//! single quotes and (for non-arrays) bare key names: `{ a: 1 }`.

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[sdifo]").expect("valid placeholder pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static QUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)':").expect("valid key pattern"));

/// One argument of a logging call or an evaluation result
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Symbol, already in its `Symbol(desc)` form
    Symbol(String),
    /// Function, as its source text
    Function(String),
    /// Object or array
    Object(Value),
}

impl Arg {
    /// Truthiness by the host scripting language's rules
    pub fn is_truthy(&self) -> bool {
        match self {
            Arg::Undefined | Arg::Null => false,
            Arg::Bool(b) => *b,
            Arg::Number(n) => *n != 0.0 && !n.is_nan(),
            Arg::Str(s) => !s.is_empty(),
            Arg::Symbol(_) | Arg::Function(_) | Arg::Object(_) => true,
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Number(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Number(f64::from(n))
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(b),
            Value::Number(n) => Arg::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Arg::Str(s),
            other => Arg::Object(other),
        }
    }
}

/// Format an argument list into one display string.
pub fn format_args(args: &[Arg]) -> String {
    let Some((first, rest)) = args.split_first() else {
        return String::new();
    };

    let mut parts = Vec::with_capacity(args.len());
    let mut used = 0;
    match first {
        Arg::Str(template) if PLACEHOLDER.is_match(template) => {
            let formatted = PLACEHOLDER.replace_all(template, |_: &Captures| {
                let arg = rest.get(used).map_or_else(|| "undefined".to_string(), format_arg);
                used += 1;
                arg
            });
            parts.push(formatted.into_owned());
        }
        other => parts.push(format_arg(other)),
    }
    parts.extend(rest.iter().skip(used).map(format_arg));
    parts.join(" ")
}

/// Stringify a single argument.
pub fn format_arg(arg: &Arg) -> String {
    match arg {
        Arg::Undefined => "undefined".to_string(),
        Arg::Null => "null".to_string(),
        Arg::Bool(b) => b.to_string(),
        Arg::Number(n) => format_number(*n),
        Arg::Str(s) => s.clone(),
        Arg::Symbol(s) | Arg::Function(s) => s.clone(),
        Arg::Object(value) => format_object(value),
    }
}

/// Pretty-print a structured value onto one line.
pub fn format_object(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let collapsed = WHITESPACE.replace_all(&pretty, " ").replace('"', "'");
    if value.is_array() {
        collapsed
    } else {
        QUOTED_KEY.replace_all(&collapsed, "$1:").into_owned()
    }
}

/// Number to text the way the host language prints it: `2`, `0.5`, `NaN`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() >= 1e21 {
        return format!("{:e}", n).replace('e', "e+");
    }
    if n.abs() < 1e-6 {
        return format!("{:e}", n);
    }
    format!("{}", n)
}
