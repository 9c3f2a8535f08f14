//! Interval-driven automatic stepping.
//!
//! The engine has no notion of time. `AutoPlayer` is the external driver that calls
//! [`ExecutionEngine::step`] on a fixed interval until the run halts, is stopped through a
//! [`StopHandle`], or hits its step limit. Stopping is cooperative: it is observed between
//! steps and never interrupts one.

use crate::machine::ExecutionEngine;
use crate::types::{Outcome, Step, MAX_EXECUTION_STEPS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Default delay between automatic steps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Why a play session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayResult {
    Halted(Outcome),
    Stopped,
    StepLimit,
}

/// Requests that a running play session stop before its next step. Cheap to clone and safe
/// to trigger from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct AutoPlayer {
    interval: Duration,
    max_steps: usize,
    stop: StopHandle,
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl AutoPlayer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_steps: MAX_EXECUTION_STEPS,
            stop: StopHandle::default(),
        }
    }

    /// Caps the number of steps a single play session may take.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A handle that stops the current or next play session.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Steps `engine` until it halts, the session is stopped, or the step limit is reached,
    /// calling `on_step` after every step.
    ///
    /// A stop requested before this call is discarded; only requests made while playing
    /// count. An engine that is already halted returns immediately with its outcome.
    pub fn play<F>(&self, engine: &mut ExecutionEngine, mut on_step: F) -> PlayResult
    where
        F: FnMut(&ExecutionEngine),
    {
        self.stop.clear();

        if let Some(outcome) = engine.outcome() {
            return PlayResult::Halted(outcome);
        }

        for taken in 1..=self.max_steps {
            if self.stop.is_stopped() {
                debug!(steps = taken - 1, "auto-play stopped");
                return PlayResult::Stopped;
            }

            let step = engine.step();
            on_step(engine);

            if let Step::Halt(outcome) = step {
                return PlayResult::Halted(outcome);
            }

            if taken < self.max_steps && !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }

        PlayResult::StepLimit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MachineModel;
    use crate::types::{Direction, Transition};

    fn looping_machine() -> ExecutionEngine {
        let model = MachineModel::new(
            "loop",
            [],
            [],
            vec![Transition {
                from: "loop".into(),
                read: "_".into(),
                to: "loop".into(),
                write: "_".into(),
                direction: Direction::Right,
            }],
        );
        let mut engine = ExecutionEngine::new(model);
        engine.reset("");
        engine
    }

    fn accepting_machine(input: &str) -> ExecutionEngine {
        let model = MachineModel::new(
            "q0",
            ["done".to_string()],
            [],
            vec![
                Transition {
                    from: "q0".into(),
                    read: "a".into(),
                    to: "q0".into(),
                    write: "a".into(),
                    direction: Direction::Right,
                },
                Transition {
                    from: "q0".into(),
                    read: "_".into(),
                    to: "done".into(),
                    write: "_".into(),
                    direction: Direction::Stay,
                },
            ],
        );
        let mut engine = ExecutionEngine::new(model);
        engine.reset(input);
        engine
    }

    #[test]
    fn test_plays_until_halt() {
        let mut engine = accepting_machine("aaa");
        let mut calls = 0;

        let result = AutoPlayer::new(Duration::ZERO).play(&mut engine, |_| calls += 1);

        assert_eq!(result, PlayResult::Halted(Outcome::Accepted));
        assert_eq!(calls, 4);
        assert_eq!(engine.step_count(), 4);
    }

    #[test]
    fn test_step_limit() {
        let mut engine = looping_machine();
        let player = AutoPlayer::new(Duration::ZERO).with_max_steps(10);

        assert_eq!(player.play(&mut engine, |_| {}), PlayResult::StepLimit);
        assert_eq!(engine.step_count(), 10);
        assert!(!engine.is_halted());
    }

    #[test]
    fn test_stop_from_callback() {
        let mut engine = looping_machine();
        let player = AutoPlayer::new(Duration::ZERO);
        let handle = player.stop_handle();

        let result = player.play(&mut engine, |engine| {
            if engine.step_count() == 3 {
                handle.stop();
            }
        });

        assert_eq!(result, PlayResult::Stopped);
        assert_eq!(engine.step_count(), 3);
    }

    #[test]
    fn test_stop_from_another_thread() {
        let mut engine = looping_machine();
        let player = AutoPlayer::new(Duration::from_millis(1)).with_max_steps(1_000_000);
        let handle = player.stop_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });

        let result = player.play(&mut engine, |_| {});
        stopper.join().unwrap();

        assert_eq!(result, PlayResult::Stopped);
        assert!(engine.step_count() > 0);
    }

    #[test]
    fn test_earlier_stop_request_is_discarded() {
        let mut engine = accepting_machine("a");
        let player = AutoPlayer::new(Duration::ZERO);
        player.stop_handle().stop();

        assert_eq!(
            player.play(&mut engine, |_| {}),
            PlayResult::Halted(Outcome::Accepted)
        );
    }

    #[test]
    fn test_already_halted_engine() {
        let mut engine = accepting_machine("");
        engine.step();

        let mut calls = 0;
        let result = AutoPlayer::default().play(&mut engine, |_| calls += 1);

        assert_eq!(result, PlayResult::Halted(Outcome::Accepted));
        assert_eq!(calls, 0);
    }
}
