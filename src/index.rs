//! Constant-time transition lookup keyed by `(state, symbol)`.

use crate::model::MachineModel;
use crate::types::{State, Symbol, Transition};
use std::collections::HashMap;

/// Maps `(from, read)` to the transition the engine should take.
///
/// Keys are nested (`state -> symbol -> transition`) so lookups borrow `&str` instead of
/// building an owned tuple key on every step.
#[derive(Debug, Clone, Default)]
pub struct TransitionIndex {
    table: HashMap<State, HashMap<Symbol, Transition>>,
    len: usize,
}

impl TransitionIndex {
    /// Builds the index from the model's transitions in declaration order. A later
    /// transition with the same `(from, read)` key replaces the earlier one.
    pub fn build(model: &MachineModel) -> Self {
        let mut index = Self::default();

        for transition in model.transitions() {
            let replaced = index
                .table
                .entry(transition.from.clone())
                .or_default()
                .insert(transition.read.clone(), transition.clone());

            if replaced.is_none() {
                index.len += 1;
            }
        }

        index
    }

    /// Returns the transition for `state` reading `symbol`, if any.
    pub fn lookup(&self, state: &str, symbol: &str) -> Option<&Transition> {
        self.table.get(state)?.get(symbol)
    }

    /// Number of distinct `(from, read)` keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `state` has at least one outgoing transition.
    pub fn has_transitions_from(&self, state: &str) -> bool {
        self.table.get(state).is_some_and(|row| !row.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn transition(from: &str, read: &str, to: &str) -> Transition {
        Transition {
            from: from.into(),
            read: read.into(),
            to: to.into(),
            write: read.into(),
            direction: Direction::Right,
        }
    }

    #[test]
    fn test_lookup() {
        let model = MachineModel::new(
            "q0",
            [],
            [],
            vec![transition("q0", "a", "q1"), transition("q1", "b", "q0")],
        );
        let index = TransitionIndex::build(&model);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("q0", "a").unwrap().to, "q1");
        assert_eq!(index.lookup("q1", "b").unwrap().to, "q0");
        assert!(index.lookup("q0", "b").is_none());
        assert!(index.lookup("q2", "a").is_none());
        assert!(index.has_transitions_from("q1"));
        assert!(!index.has_transitions_from("q2"));
    }

    #[test]
    fn test_last_declared_transition_wins() {
        let model = MachineModel::new(
            "q0",
            [],
            [],
            vec![
                transition("q0", "a", "first"),
                transition("q0", "b", "other"),
                transition("q0", "a", "second"),
            ],
        );
        let index = TransitionIndex::build(&model);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("q0", "a").unwrap().to, "second");
    }

    #[test]
    fn test_symbols_compare_exactly() {
        let model = MachineModel::new("q0", [], [], vec![transition("q0", "A", "q1")]);
        let index = TransitionIndex::build(&model);

        assert!(index.lookup("q0", "a").is_none());
        assert!(index.lookup("Q0", "A").is_none());
        assert!(index.lookup("q0", "A").is_some());
    }

    #[test]
    fn test_empty_model() {
        let index = TransitionIndex::build(&MachineModel::new("q0", [], [], Vec::new()));
        assert!(index.is_empty());
    }
}
