//! Variable parsing and substitution for manifest interpolation.
//!
//! Manifests can reference values that are supplied at push time through
//! vars files or `--var NAME=VALUE` pairs. This module handles parsing
//! placeholder strings and substituting resolved values into a YAML tree.
//!
//! # Placeholder Format
//!
//! - `((name))` - the value of variable `name`
//! - `((name.key))` - key `key` inside the mapping stored in variable `name`
//! - `((!name))` - same as `((name))`; the `!` marker is accepted and ignored
//!
//! Names may contain letters, digits, `_`, `-`, `.` and `/`. Anything else
//! between `((` and `))` is left as literal text.
//!
//! # Substitution
//!
//! A string that consists of exactly one placeholder is replaced by the
//! variable's YAML value, so `instances: ((count))` stays an integer.
//! Placeholders embedded in longer strings are replaced by the scalar's text.
//!
//! # Example
//!
//! ```
//! use deckhand_lib::interpolate::{parse, Segment};
//!
//! let segments = parse("https://((host))/health");
//! assert_eq!(segments, vec![
//!     Segment::Literal("https://".to_string()),
//!     Segment::Placeholder("host".to_string()),
//!     Segment::Literal("/health".to_string()),
//! ]);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A variable reference, by name
  Placeholder(String),
}

/// Errors that can occur during interpolation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
  /// Strict mode: every referenced variable must resolve.
  #[error("Expected to find variables: {}", .0.join(", "))]
  MissingVariables(Vec<String>),

  #[error("variable '{name}' is not a scalar and cannot be embedded in a string")]
  NotScalar { name: String },
}

/// Errors from parsing a `NAME=VALUE` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarKvError {
  #[error("expected NAME=VALUE, got '{0}'")]
  MissingSeparator(String),

  #[error("variable name must not be empty")]
  EmptyName,
}

/// An inline variable given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarKv {
  pub name: String,
  pub value: String,
}

impl FromStr for VarKv {
  type Err = VarKvError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (name, value) = s
      .split_once('=')
      .ok_or_else(|| VarKvError::MissingSeparator(s.to_string()))?;
    if name.is_empty() {
      return Err(VarKvError::EmptyName);
    }
    Ok(Self {
      name: name.to_string(),
      value: value.to_string(),
    })
  }
}

/// Substitution table built from vars files and inline pairs.
///
/// Later writes win key-by-key, so callers merge files in order and then
/// apply inline pairs for the highest precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(BTreeMap<String, Value>);

impl Variables {
  pub fn new() -> Self {
    Self::default()
  }

  /// Overlay every entry of a vars-file mapping.
  pub fn merge(&mut self, mapping: Mapping) {
    for (key, value) in mapping {
      if let Some(name) = scalar_text(&key) {
        self.0.insert(name, value);
      }
    }
  }

  /// Overlay a single inline pair.
  ///
  /// Values that read as a YAML number or boolean keep that type, so
  /// `n=3` can fill `instances: ((n))`. Everything else stays a string.
  pub fn set(&mut self, kv: VarKv) {
    let value = match serde_yaml::from_str::<Value>(&kv.value) {
      Ok(typed @ (Value::Number(_) | Value::Bool(_))) => typed,
      _ => Value::String(kv.value),
    };
    self.0.insert(kv.name, value);
  }

  /// Look up a variable, descending into mappings for dotted names.
  ///
  /// An exact match on the full name takes precedence over a dotted path.
  pub fn get(&self, name: &str) -> Option<&Value> {
    if let Some(value) = self.0.get(name) {
      return Some(value);
    }

    let mut parts = name.split('.');
    let mut current = self.0.get(parts.next()?)?;
    for part in parts {
      current = current.as_mapping()?.get(part)?;
    }
    Some(current)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Parse a string containing `((name))` placeholders into segments.
///
/// Parsing never fails: text that only looks like a placeholder (an unclosed
/// `((`, or a name with characters outside the allowed set) is kept as a
/// literal.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(start) = rest.find("((") {
    literal.push_str(&rest[..start]);
    let inner = &rest[start + 2..];

    match inner.find("))") {
      Some(end) if is_var_name(&inner[..end]) => {
        // Flush accumulated literal
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        let name = inner[..end].trim_start_matches('!');
        segments.push(Segment::Placeholder(name.to_string()));
        rest = &inner[end + 2..];
      }
      _ => {
        // Not a placeholder here; emit one paren and rescan so "(((x)))" still matches
        literal.push('(');
        rest = &rest[start + 1..];
      }
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  segments
}

fn is_var_name(candidate: &str) -> bool {
  let name = candidate.strip_prefix('!').unwrap_or(candidate);
  !name.is_empty()
    && name
      .chars()
      .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
}

/// Substitute every placeholder in a YAML tree.
///
/// Mapping keys, mapping values, sequence items, and tagged values are all
/// visited. Missing variables are collected across the whole tree and
/// reported together.
///
/// # Errors
///
/// Returns [`InterpolationError::MissingVariables`] if any placeholder has no
/// value, or [`InterpolationError::NotScalar`] if a mapping or sequence would
/// have to be embedded inside a longer string.
pub fn interpolate(value: Value, vars: &Variables) -> Result<Value, InterpolationError> {
  let mut missing = BTreeSet::new();
  let value = interpolate_value(value, vars, &mut missing)?;

  if !missing.is_empty() {
    return Err(InterpolationError::MissingVariables(missing.into_iter().collect()));
  }

  Ok(value)
}

fn interpolate_value(
  value: Value,
  vars: &Variables,
  missing: &mut BTreeSet<String>,
) -> Result<Value, InterpolationError> {
  match value {
    Value::String(text) => interpolate_string(text, vars, missing),
    Value::Sequence(items) => items
      .into_iter()
      .map(|item| interpolate_value(item, vars, missing))
      .collect::<Result<Vec<_>, _>>()
      .map(Value::Sequence),
    Value::Mapping(mapping) => {
      let mut out = Mapping::with_capacity(mapping.len());
      for (key, value) in mapping {
        out.insert(
          interpolate_value(key, vars, missing)?,
          interpolate_value(value, vars, missing)?,
        );
      }
      Ok(Value::Mapping(out))
    }
    Value::Tagged(tagged) => {
      let TaggedValue { tag, value } = *tagged;
      Ok(Value::Tagged(Box::new(TaggedValue {
        tag,
        value: interpolate_value(value, vars, missing)?,
      })))
    }
    scalar => Ok(scalar),
  }
}

fn interpolate_string(
  text: String,
  vars: &Variables,
  missing: &mut BTreeSet<String>,
) -> Result<Value, InterpolationError> {
  let segments = parse(&text);

  // Whole-value placeholder keeps the variable's YAML type
  if let [Segment::Placeholder(name)] = segments.as_slice() {
    return match vars.get(name) {
      Some(value) => Ok(value.clone()),
      None => {
        missing.insert(name.clone());
        Ok(Value::String(text))
      }
    };
  }

  if !segments.iter().any(|s| matches!(s, Segment::Placeholder(_))) {
    return Ok(Value::String(text));
  }

  let mut result = String::with_capacity(text.len());
  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(&s),
      Segment::Placeholder(name) => match vars.get(&name) {
        Some(value) => {
          let rendered = scalar_text(value).ok_or(InterpolationError::NotScalar { name })?;
          result.push_str(&rendered);
        }
        None => {
          missing.insert(name);
        }
      },
    }
  }

  Ok(Value::String(result))
}

/// Render a scalar YAML value as text; `None` for mappings and sequences.
fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null => Some(String::new()),
    Value::Tagged(tagged) => scalar_text(&tagged.value),
    Value::Sequence(_) | Value::Mapping(_) => None,
  }
}
