//! Condition-guarded finite-state machine.
//!
//! A [`StateMachine`] holds a set of named states, each owning an ordered
//! list of [`Transition`]s. A transition carries zero-argument boolean
//! conditions and a target state held as an index into the machine's own
//! state vector (non-owning). Each [`update`](StateMachine::update) takes
//! the first transition of the current state whose conditions are all true;
//! at most one transition fires per call.
//!
//! State graphs are typically built once at setup, so graph-construction
//! mistakes fail locally (`add_transition_from` on unknown names is a
//! no-op) and are meant to be caught by [`validate`](StateMachine::validate)
//! before the tick loop starts, not by a runtime fault mid-tick.
//!
//! There is no automatic entry-action hook: callers wanting entry behavior
//! must run it themselves when they observe a state change.

use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Setup-time validation failures.
#[derive(Debug, thiserror::Error)]
pub enum StateMachineError {
    /// The machine has no states at all.
    #[error("state machine has no states")]
    Empty,
    /// No current state has been selected.
    #[error("no current state set; call set_current before updating")]
    NoCurrentState,
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// A zero-argument boolean guard.
pub type Condition = Box<dyn FnMut() -> bool>;

/// A directed, multi-condition edge between two states.
///
/// Conditions are evaluated in the order they were added and short-circuit
/// on the first false.
#[derive(Default)]
pub struct Transition {
    conditions: Vec<Condition>,
}

impl Transition {
    /// A transition with no conditions (always taken when reached).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition, builder-style.
    pub fn when(mut self, condition: impl FnMut() -> bool + 'static) -> Self {
        self.add_condition(condition);
        self
    }

    /// Append a condition.
    pub fn add_condition(&mut self, condition: impl FnMut() -> bool + 'static) {
        self.conditions.push(Box::new(condition));
    }

    /// True if every condition evaluates true, stopping at the first false.
    fn all_conditions_met(&mut self) -> bool {
        for condition in &mut self.conditions {
            if !condition() {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// StateMachine
// ---------------------------------------------------------------------------

struct StateNode {
    name: String,
    /// Transitions in insertion order, each with its target state index.
    transitions: Vec<(Transition, usize)>,
}

/// A finite set of named states with exactly one current state.
///
/// The current state is selected externally via
/// [`set_current`](StateMachine::set_current); construction order implies
/// nothing.
#[derive(Default)]
pub struct StateMachine {
    states: Vec<StateNode>,
    current: Option<usize>,
}

impl StateMachine {
    /// An empty machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state with the given name.
    ///
    /// Duplicate names are allowed but only the first is ever found by
    /// name lookups.
    pub fn add_state(&mut self, name: impl Into<String>) {
        self.states.push(StateNode {
            name: name.into(),
            transitions: Vec::new(),
        });
    }

    /// True if a state with the given name exists.
    pub fn has_state(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Select the current state by name. Returns `false` (and changes
    /// nothing) if the name is unknown.
    pub fn set_current(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(idx) => {
                self.current = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Name of the current state, if one is set.
    pub fn current_state(&self) -> Option<&str> {
        self.current.map(|idx| self.states[idx].name.as_str())
    }

    /// Add a transition from state `from` to state `to`.
    ///
    /// If either name is unknown this is a local no-op and returns `false`;
    /// run [`validate`](StateMachine::validate) (and check these return
    /// values) at setup time to catch typos.
    pub fn add_transition_from(&mut self, from: &str, to: &str, transition: Transition) -> bool {
        let (Some(from_idx), Some(to_idx)) = (self.index_of(from), self.index_of(to)) else {
            debug!(from, to, "ignoring transition between unknown states");
            return false;
        };
        self.states[from_idx].transitions.push((transition, to_idx));
        true
    }

    /// Advance the machine by one evaluation.
    ///
    /// Scans the current state's transitions in insertion order and takes
    /// the first whose conditions are all met. At most one transition fires
    /// per call; if none fire (or no current state is set) nothing changes.
    pub fn update(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        let mut next = None;
        for (transition, target) in &mut self.states[current].transitions {
            if transition.all_conditions_met() {
                next = Some(*target);
                break;
            }
        }
        if let Some(target) = next {
            self.current = Some(target);
        }
    }

    /// Setup-time sanity check: the machine has states and a current one.
    pub fn validate(&self) -> Result<(), StateMachineError> {
        if self.states.is_empty() {
            return Err(StateMachineError::Empty);
        }
        if self.current.is_none() {
            return Err(StateMachineError::NoCurrentState);
        }
        Ok(())
    }

    /// Number of states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
