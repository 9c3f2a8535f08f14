//! This module defines `MachineModel`, the normalized form of a machine definition, and its
//! construction from a generic deserialized value.
//!
//! Construction is deliberately permissive about two things: duplicate `(from, read)` keys
//! (the last one wins at lookup time) and states listed in both `accept` and `reject`
//! (acceptance wins). Neither is reported as an error; see [`crate::analyzer`] for warnings.

use crate::types::{DefinitionError, Direction, State, Transition};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// A validated machine definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineModel {
    start: State,
    accept: BTreeSet<State>,
    reject: BTreeSet<State>,
    transitions: Vec<Transition>,
}

impl MachineModel {
    /// Builds a model directly from its parts. No validation is needed since every part is
    /// already typed.
    pub fn new(
        start: impl Into<State>,
        accept: impl IntoIterator<Item = State>,
        reject: impl IntoIterator<Item = State>,
        transitions: Vec<Transition>,
    ) -> Self {
        Self {
            start: start.into(),
            accept: accept.into_iter().collect(),
            reject: reject.into_iter().collect(),
            transitions,
        }
    }

    /// Validates a raw definition value and converts it into a `MachineModel`.
    ///
    /// Recognized keys are `start` (required scalar), `accept` and `reject` (optional
    /// sequences of scalars) and `transitions` (required sequence of mappings with `from`,
    /// `read`, `to`, `write` and `move`). Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first `DefinitionError` encountered, checking `start`, then `accept` and
    /// `reject`, then each transition in order.
    pub fn from_value(raw: &Value) -> Result<Self, DefinitionError> {
        let root = raw.as_object().ok_or(DefinitionError::NotAMapping)?;

        let start = root
            .get("start")
            .and_then(scalar)
            .ok_or(DefinitionError::MissingStart)?;
        let accept = state_set(root, "accept")?;
        let reject = state_set(root, "reject")?;

        let transitions = root
            .get("transitions")
            .and_then(Value::as_array)
            .ok_or(DefinitionError::MissingTransitions)?
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_transition(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            start,
            accept,
            reject,
            transitions,
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn accept(&self) -> &BTreeSet<State> {
        &self.accept
    }

    pub fn reject(&self) -> &BTreeSet<State> {
        &self.reject
    }

    /// Transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept.contains(state)
    }

    pub fn is_rejecting(&self, state: &str) -> bool {
        self.reject.contains(state)
    }

    /// Returns every state mentioned anywhere in the definition, in first-seen order:
    /// the start state, then transition endpoints, then accept and reject states.
    pub fn states(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut states = Vec::new();

        let candidates = std::iter::once(self.start.as_str())
            .chain(
                self.transitions
                    .iter()
                    .flat_map(|t| [t.from.as_str(), t.to.as_str()]),
            )
            .chain(self.accept.iter().map(String::as_str))
            .chain(self.reject.iter().map(String::as_str));

        for state in candidates {
            if seen.insert(state) {
                states.push(state);
            }
        }

        states
    }
}

/// Converts a scalar value to its textual identity. Sequences, mappings and null are not scalars.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn state_set(
    root: &Map<String, Value>,
    field: &'static str,
) -> Result<BTreeSet<State>, DefinitionError> {
    match root.get(field) {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar(item).ok_or(DefinitionError::InvalidStateSet { field }))
            .collect(),
        Some(other) => scalar(other)
            .map(|state| BTreeSet::from([state]))
            .ok_or(DefinitionError::InvalidStateSet { field }),
    }
}

fn parse_transition(index: usize, entry: &Value) -> Result<Transition, DefinitionError> {
    let fields = entry
        .as_object()
        .ok_or(DefinitionError::TransitionNotAMapping { index })?;

    let field = |name: &'static str| {
        fields
            .get(name)
            .and_then(scalar)
            .ok_or(DefinitionError::MalformedTransition { index, field: name })
    };

    let from = field("from")?;
    let read = field("read")?;
    let to = field("to")?;
    let write = field("write")?;
    let token = field("move")?;

    let direction = Direction::from_token(&token)
        .ok_or(DefinitionError::InvalidDirection { index, token })?;

    Ok(Transition {
        from,
        read,
        to,
        write,
        direction,
    })
}
