//! This module defines the core data structures and types shared by the workbench: symbols,
//! states, transitions, run outcomes, trace entries and the error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A tape symbol. Usually a single character, compared by exact equality.
pub type Symbol = String;
/// A machine state label.
pub type State = String;

/// The reserved symbol denoting an empty tape cell.
pub const BLANK_SYMBOL: &str = "_";
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB
/// The maximum number of steps `run` executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 10000;

/// Represents the possible directions the head can move.
///
/// Serialized as the single-letter tokens used in machine definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(rename = "L")]
    Left,
    /// Move the head one position to the right.
    #[serde(rename = "R")]
    Right,
    /// Keep the head in the same position.
    #[serde(rename = "S")]
    Stay,
}

impl Direction {
    /// Parses a case-sensitive direction token (`R`, `L` or `S`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "L" => Some(Direction::Left),
            "R" => Some(Direction::Right),
            "S" => Some(Direction::Stay),
            _ => None,
        }
    }

    /// Returns the token this direction is written as in a definition.
    pub fn token(&self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'S',
        }
    }

    /// The signed head offset for this direction.
    pub fn offset(&self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A single transition rule: in state `from` reading `read`, write `write`, move the head
/// and continue in state `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: State,
    pub read: Symbol,
    pub to: State,
    pub write: Symbol,
    #[serde(rename = "move")]
    pub direction: Direction,
}

impl Transition {
    /// The edge label used in the transition graph, e.g. `a→b,R`.
    pub fn label(&self) -> String {
        format!("{}→{},{}", self.read, self.write, self.direction.token())
    }
}

/// How a halted run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The machine entered an accept state.
    Accepted,
    /// The machine entered a reject state.
    Rejected,
    /// No transition matched the current state and symbol.
    Stalled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
            Outcome::Stalled => "stalled",
        };
        f.write_str(name)
    }
}

/// The lifecycle status of a run. `Running` is the only non-terminal status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Running,
    Halted(Outcome),
}

impl Status {
    pub fn is_halted(&self) -> bool {
        matches!(self, Status::Halted(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Status::Running => None,
            Status::Halted(outcome) => Some(*outcome),
        }
    }
}

/// Represents the signal returned by a single engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a step and is still running.
    Continue,
    /// The machine is halted with the given outcome.
    Halt(Outcome),
}

/// One line of the user-visible run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEntry {
    /// Recorded at the start of every effective step.
    Step {
        state: State,
        head: usize,
        symbol: Symbol,
    },
    Stalled,
    Accepted { state: State },
    Rejected { state: State },
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEntry::Step {
                state,
                head,
                symbol,
            } => write!(f, "State={state}, Position={head}, Symbol={symbol}"),
            TraceEntry::Stalled => write!(f, "Machine stalled"),
            TraceEntry::Accepted { state } => write!(f, "Accepted in state {state}"),
            TraceEntry::Rejected { state } => write!(f, "Rejected in state {state}"),
        }
    }
}

/// Errors raised while turning a raw definition value into a `MachineModel`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// The definition root is not a mapping.
    #[error("Definition must be a mapping of keys to values")]
    NotAMapping,
    /// `start` is absent, null or not a scalar.
    #[error("Missing or non-scalar 'start' state")]
    MissingStart,
    /// `transitions` is absent or not a sequence.
    #[error("Missing 'transitions' sequence")]
    MissingTransitions,
    /// A transition entry lacks a field, or the field is not a scalar.
    #[error("Malformed transition at index {index}: missing or non-scalar '{field}'")]
    MalformedTransition { index: usize, field: &'static str },
    /// A transition entry is not a mapping.
    #[error("Malformed transition at index {index}: expected a mapping")]
    TransitionNotAMapping { index: usize },
    /// A transition's `move` is not one of `R`, `L`, `S`.
    #[error("Invalid direction '{token}' at transition {index} (expected R, L or S)")]
    InvalidDirection { index: usize, token: String },
    /// `accept` or `reject` is neither a sequence nor a scalar.
    #[error("'{field}' must be a sequence of states")]
    InvalidStateSet { field: &'static str },
}

/// Represents the errors that can occur while loading machine definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// Indicates a syntax error in the textual notation.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates that the parsed value is not a valid machine definition.
    #[error("Invalid machine definition: {0}")]
    Definition(#[from] DefinitionError),
    /// Indicates malformed JSON input.
    #[error("JSON error: {0}")]
    JsonError(String),
    /// Indicates a failed lookup or an input that violates a size limit.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}
