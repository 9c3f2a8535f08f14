//! This module provides functions for analyzing machine definitions to surface suspicious but
//! legal constructs before execution. Nothing here rejects a definition: duplicate keys and
//! overlapping accept/reject sets stay valid and are only reported.

use crate::index::TransitionIndex;
use crate::model::MachineModel;
use crate::types::State;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A non-fatal finding about a machine definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Diagnostic {
    /// Several transitions share a `(from, read)` key; the last index is the one used.
    DuplicateTransition {
        from: State,
        read: String,
        indices: Vec<usize>,
    },
    /// A state is both accepting and rejecting; acceptance takes precedence.
    AcceptRejectOverlap(State),
    /// Transition endpoints that cannot be reached from the start state.
    UnreachableStates(Vec<State>),
    /// Accept or reject states that no transition leads to.
    UnusedTerminalStates(Vec<State>),
    /// The start state has no outgoing transitions, so the first step stalls.
    StartHasNoTransitions(State),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateTransition {
                from,
                read,
                indices,
            } => write!(
                f,
                "Transitions {:?} share the key ({}, {}); only the last one is used",
                indices, from, read
            ),
            Diagnostic::AcceptRejectOverlap(state) => write!(
                f,
                "State '{}' is both accepting and rejecting; it accepts",
                state
            ),
            Diagnostic::UnreachableStates(states) => {
                write!(f, "Unreachable states detected: {:?}", states)
            }
            Diagnostic::UnusedTerminalStates(states) => {
                write!(f, "Terminal states never entered by a transition: {:?}", states)
            }
            Diagnostic::StartHasNoTransitions(state) => {
                write!(f, "Start state '{}' has no outgoing transitions", state)
            }
        }
    }
}

/// Analyzes a `MachineModel` and returns every diagnostic found, in a stable order.
///
/// # Arguments
///
/// * `model` - A reference to the `MachineModel` to be analyzed.
pub fn analyze(model: &MachineModel) -> Vec<Diagnostic> {
    let checks: [fn(&MachineModel) -> Vec<Diagnostic>; 5] = [
        check_duplicate_transitions,
        check_accept_reject_overlap,
        check_start_transitions,
        check_unreachable_states,
        check_unused_terminal_states,
    ];

    checks.iter().flat_map(|check| check(model)).collect()
}

/// Reports `(from, read)` keys declared more than once, in order of first declaration.
fn check_duplicate_transitions(model: &MachineModel) -> Vec<Diagnostic> {
    let mut keys: Vec<(&str, &str)> = Vec::new();
    let mut positions: HashMap<(&str, &str), Vec<usize>> = HashMap::new();

    for (i, transition) in model.transitions().iter().enumerate() {
        let key = (transition.from.as_str(), transition.read.as_str());
        let entry = positions.entry(key).or_default();
        if entry.is_empty() {
            keys.push(key);
        }
        entry.push(i);
    }

    keys.into_iter()
        .filter_map(|key| {
            let indices = positions.remove(&key)?;
            (indices.len() > 1).then(|| Diagnostic::DuplicateTransition {
                from: key.0.to_string(),
                read: key.1.to_string(),
                indices,
            })
        })
        .collect()
}

fn check_accept_reject_overlap(model: &MachineModel) -> Vec<Diagnostic> {
    model
        .accept()
        .intersection(model.reject())
        .map(|state| Diagnostic::AcceptRejectOverlap(state.clone()))
        .collect()
}

fn check_start_transitions(model: &MachineModel) -> Vec<Diagnostic> {
    let start = model.start();
    let has_outgoing = model.transitions().iter().any(|t| t.from == start);

    if has_outgoing || model.is_accepting(start) || model.is_rejecting(start) {
        return Vec::new();
    }

    vec![Diagnostic::StartHasNoTransitions(start.to_string())]
}

/// Checks for unreachable states by performing a depth-first traversal from the start state.
///
/// Only states that appear as transition endpoints are considered; states named solely in
/// `accept` or `reject` are covered by [`check_unused_terminal_states`]. Transitions shadowed
/// by a later declaration with the same `(from, read)` key are never taken, so they add no
/// edges.
fn check_unreachable_states(model: &MachineModel) -> Vec<Diagnostic> {
    let index = TransitionIndex::build(model);
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for transition in model.transitions() {
        if index.lookup(&transition.from, &transition.read) != Some(transition) {
            continue;
        }
        successors
            .entry(transition.from.as_str())
            .or_default()
            .push(transition.to.as_str());
    }

    let mut visited = HashSet::new();
    let mut stack = vec![model.start()];

    while let Some(state) = stack.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(next) = successors.get(state) {
            stack.extend(next.iter().filter(|s| !visited.contains(*s)));
        }
    }

    let mut unreachable: Vec<State> = model
        .transitions()
        .iter()
        .flat_map(|t| [t.from.as_str(), t.to.as_str()])
        .filter(|state| !visited.contains(state))
        .map(str::to_string)
        .collect();

    if unreachable.is_empty() {
        return Vec::new();
    }

    // Sort for deterministic output
    unreachable.sort();
    unreachable.dedup();
    vec![Diagnostic::UnreachableStates(unreachable)]
}

fn check_unused_terminal_states(model: &MachineModel) -> Vec<Diagnostic> {
    let targets: HashSet<&str> = model
        .transitions()
        .iter()
        .map(|t| t.to.as_str())
        .chain(std::iter::once(model.start()))
        .collect();

    let unused: Vec<State> = model
        .accept()
        .union(model.reject())
        .filter(|state| !targets.contains(state.as_str()))
        .cloned()
        .collect();

    if unused.is_empty() {
        return Vec::new();
    }

    vec![Diagnostic::UnusedTerminalStates(unused)]
}
