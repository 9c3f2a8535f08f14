//! This crate provides the core of a Turing machine workbench.
//! It turns machine definitions into a validated model, runs that model step by step against
//! an input tape, and derives the machine's state-transition graph for rendering.

pub mod analyzer;
pub mod graph;
pub mod index;
pub mod loader;
pub mod machine;
pub mod model;
pub mod parser;
pub mod player;
pub mod programs;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `Diagnostic` enum from the analyzer module.
pub use analyzer::{analyze, Diagnostic};
/// Re-exports the graph derivation entry point and its output types.
pub use graph::{derive, Edge, Graph, Node, NodeStyle};
pub use index::TransitionIndex;
/// Re-exports the `DefinitionLoader` struct from the loader module.
pub use loader::DefinitionLoader;
/// Re-exports the execution engine, its state snapshot and the observer trait.
pub use machine::{ExecutionEngine, ExecutionState, StateObserver};
pub use model::MachineModel;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
pub use player::{AutoPlayer, PlayResult, StopHandle};
/// Re-exports `Example`, `ProgramManager`, and `EXAMPLES` from the programs module.
pub use programs::{Example, ProgramManager, EXAMPLES};
/// Re-exports the shared types.
pub use types::{
    DefinitionError, Direction, Outcome, State, Status, Step, Symbol, TraceEntry, Transition,
    TuringMachineError, BLANK_SYMBOL, MAX_DEFINITION_SIZE, MAX_EXECUTION_STEPS,
};
