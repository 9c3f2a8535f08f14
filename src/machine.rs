//! This module defines `ExecutionEngine`, which runs a single-tape machine step by step
//! against an input tape. It owns the tape, head, current state and run history, and
//! reports every state change to an optional observer.

use crate::index::TransitionIndex;
use crate::model::MachineModel;
use crate::types::{
    Outcome, State, Status, Step, Symbol, TraceEntry, Transition, BLANK_SYMBOL,
    MAX_EXECUTION_STEPS,
};
use serde::Serialize;
use std::mem;
use tracing::{debug, info};

/// Receives the current state after every reset and every effective step.
///
/// This is the channel external visualizations use to highlight the active state.
pub trait StateObserver {
    fn state_changed(&mut self, state: &str);
}

impl<F: FnMut(&str)> StateObserver for F {
    fn state_changed(&mut self, state: &str) {
        self(state)
    }
}

/// A snapshot of a run: tape, head, current state, status and history.
///
/// The engine replaces this value wholesale on every step, so a snapshot is always a
/// consistent configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionState {
    pub tape: Vec<Symbol>,
    pub head: usize,
    pub current: State,
    pub status: Status,
    pub trace: Vec<TraceEntry>,
    pub steps: usize,
}

impl ExecutionState {
    /// Creates the initial configuration for `input`: one cell per character, head on the
    /// first cell, running in `start`.
    pub fn initial(start: &str, input: &str) -> Self {
        Self {
            tape: input.chars().map(String::from).collect(),
            head: 0,
            current: start.to_string(),
            status: Status::Running,
            trace: Vec::new(),
            steps: 0,
        }
    }

    /// The symbol under the head. Cells that were never materialized read as blank.
    pub fn symbol(&self) -> &str {
        self.tape
            .get(self.head)
            .map(String::as_str)
            .unwrap_or(BLANK_SYMBOL)
    }

    pub fn is_halted(&self) -> bool {
        self.status.is_halted()
    }

    /// Consumes this configuration and returns the one that follows it.
    ///
    /// The tape and trace are moved into the result and extended in place. A halted
    /// configuration is handed back unchanged as `Err`.
    fn advance(mut self, model: &MachineModel, index: &TransitionIndex) -> Result<Self, Self> {
        if self.is_halted() {
            return Err(self);
        }

        let symbol = self.symbol().to_string();

        self.steps += 1;
        self.trace.push(TraceEntry::Step {
            state: self.current.clone(),
            head: self.head,
            symbol: symbol.clone(),
        });

        let Some(transition) = index.lookup(&self.current, &symbol) else {
            self.trace.push(TraceEntry::Stalled);
            self.status = Status::Halted(Outcome::Stalled);
            return Ok(self);
        };

        // Materialize the cell under the head before writing
        if self.head >= self.tape.len() {
            self.tape.resize(self.head + 1, BLANK_SYMBOL.to_string());
        }
        self.tape[self.head] = transition.write.clone();

        match self.head.checked_add_signed(transition.direction.offset()) {
            Some(head) => {
                self.head = head;
                if self.head == self.tape.len() {
                    self.tape.push(BLANK_SYMBOL.to_string());
                }
            }
            None => {
                // Moving left off the first cell grows the tape by one blank
                self.tape.insert(0, BLANK_SYMBOL.to_string());
                self.head = 0;
            }
        }

        self.current = transition.to.clone();

        if model.is_accepting(&self.current) {
            self.trace.push(TraceEntry::Accepted {
                state: self.current.clone(),
            });
            self.status = Status::Halted(Outcome::Accepted);
        } else if model.is_rejecting(&self.current) {
            self.trace.push(TraceEntry::Rejected {
                state: self.current.clone(),
            });
            self.status = Status::Halted(Outcome::Rejected);
        }

        Ok(self)
    }
}

/// Runs a `MachineModel` against an input tape.
pub struct ExecutionEngine {
    model: MachineModel,
    index: TransitionIndex,
    state: ExecutionState,
    observer: Option<Box<dyn StateObserver>>,
}

impl ExecutionEngine {
    /// Creates an engine for `model`, positioned on an empty tape in the start state.
    ///
    /// No observer is attached yet, so nothing is notified; call [`reset`](Self::reset) to
    /// load an input.
    pub fn new(model: MachineModel) -> Self {
        let index = TransitionIndex::build(&model);
        let state = ExecutionState::initial(model.start(), "");

        Self {
            model,
            index,
            state,
            observer: None,
        }
    }

    /// Attaches an observer and returns the engine.
    pub fn with_observer(mut self, observer: impl StateObserver + 'static) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer(&mut self, observer: impl StateObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Starts a fresh run on `input`, discarding the previous tape, head and trace.
    pub fn reset(&mut self, input: &str) {
        self.state = ExecutionState::initial(self.model.start(), input);
        debug!(start = %self.state.current, input, "machine reset");
        self.notify();
    }

    /// Executes a single step.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine took a transition and is still running.
    /// * `Step::Halt(outcome)` if the machine halted on this step, or was already halted.
    ///   In the latter case the call has no effect.
    pub fn step(&mut self) -> Step {
        let state = mem::take(&mut self.state);
        match state.advance(&self.model, &self.index) {
            Ok(next) => self.state = next,
            Err(halted) => {
                self.state = halted;
                return self.signal();
            }
        }

        debug!(
            state = %self.state.current,
            head = self.state.head,
            step = self.state.steps,
            "step"
        );
        if let Some(outcome) = self.outcome() {
            info!(
                %outcome,
                state = %self.state.current,
                steps = self.state.steps,
                "machine halted"
            );
        }

        // A stalled step keeps the previous state
        if self.outcome() != Some(Outcome::Stalled) {
            self.notify();
        }

        self.signal()
    }

    /// Steps until the machine halts or `MAX_EXECUTION_STEPS` steps have run.
    pub fn run(&mut self) -> Step {
        self.run_with_limit(MAX_EXECUTION_STEPS)
    }

    /// Steps until the machine halts or `limit` steps have run in this call.
    ///
    /// Returns `Step::Continue` when the limit was reached first.
    pub fn run_with_limit(&mut self, limit: usize) -> Step {
        for _ in 0..limit {
            if let halt @ Step::Halt(_) = self.step() {
                return halt;
            }
        }

        self.signal()
    }

    fn signal(&self) -> Step {
        match self.state.status {
            Status::Running => Step::Continue,
            Status::Halted(outcome) => Step::Halt(outcome),
        }
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.state_changed(&self.state.current);
        }
    }

    /// The whole run configuration.
    pub fn snapshot(&self) -> &ExecutionState {
        &self.state
    }

    pub fn model(&self) -> &MachineModel {
        &self.model
    }

    pub fn current(&self) -> &str {
        &self.state.current
    }

    pub fn head(&self) -> usize {
        self.state.head
    }

    pub fn tape(&self) -> &[Symbol] {
        &self.state.tape
    }

    /// The tape contents joined into one string.
    pub fn tape_string(&self) -> String {
        self.state.tape.concat()
    }

    /// The symbol under the head, blank if the cell is not materialized.
    pub fn symbol(&self) -> &str {
        self.state.symbol()
    }

    /// The transition the next step would take, if the machine is running and one matches.
    pub fn transition(&self) -> Option<&Transition> {
        if self.is_halted() {
            return None;
        }
        self.index.lookup(&self.state.current, self.state.symbol())
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.state.trace
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.status.outcome()
    }

    /// Number of effective steps since the last reset.
    pub fn step_count(&self) -> usize {
        self.state.steps
    }
}
