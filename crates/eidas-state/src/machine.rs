//! # Table-Driven State Machine Interpreter
//!
//! A [`Machine`] is parameterized by a static transition table built with
//! [`MachineConfig`]:
//!
//! ```text
//! State ──(event id)──▶ Transition { target, actions: [fn(&mut Context, &Event)] }
//! ```
//!
//! ## Semantics of `send`
//!
//! 1. Look up `(current state, event.id())`.
//! 2. Absent: return [`MachineError::InvalidTransition`]. State, context and
//!    history are untouched.
//! 3. Present: run every action in registration order against the current
//!    context and the event, then move to the target state and append a
//!    [`TransitionRecord`].
//!
//! Transitions are a pure function of `(state, event id)`; actions are the
//! only place the context changes. `send` takes `&mut self`, so calls are
//! serialised by construction.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use thiserror::Error;

/// An event the machine can be sent.
///
/// The id selects the transition; the event value itself carries the
/// payload actions read.
pub trait MachineEvent {
    /// Discriminator used as the transition table key.
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display;

    /// The discriminator of this event.
    fn id(&self) -> Self::Id;
}

/// A side effect run while taking a transition.
pub type Action<C, E> = Arc<dyn Fn(&mut C, &E) + Send + Sync>;

// -- Errors -------------------------------------------------------------------

/// Errors that can occur when sending an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// The current state has no transition for the event.
    #[error("invalid transition from state \"{state}\" on event \"{event}\"")]
    InvalidTransition {
        /// Current state.
        state: String,
        /// Rejected event id.
        event: String,
    },
}

// -- Transition ---------------------------------------------------------------

/// Target state and actions for one `(state, event id)` entry.
pub struct Transition<S, C, E> {
    target: S,
    actions: Vec<Action<C, E>>,
}

impl<S, C, E> Transition<S, C, E> {
    /// A transition to `target` with no actions.
    pub fn to(target: S) -> Self {
        Self {
            target,
            actions: Vec::new(),
        }
    }

    /// Append an action. Actions run in the order they were added.
    pub fn with_action(mut self, action: impl Fn(&mut C, &E) + Send + Sync + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    /// The state this transition leads to.
    pub fn target(&self) -> &S {
        &self.target
    }

    /// Number of registered actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl<S: Clone, C, E> Clone for Transition<S, C, E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            actions: self.actions.clone(),
        }
    }
}

impl<S: fmt::Debug, C, E> fmt::Debug for Transition<S, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("target", &self.target)
            .field("actions", &self.actions.len())
            .finish()
    }
}

// -- Transition Record --------------------------------------------------------

/// Record of a transition the machine took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord<S, I> {
    /// State before the transition.
    pub from: S,
    /// State after the transition.
    pub to: S,
    /// Event id that triggered it.
    pub event: I,
}

// -- Config -------------------------------------------------------------------

/// Initial state, initial context and the transition table.
pub struct MachineConfig<S, C, E: MachineEvent> {
    initial: S,
    context: C,
    states: HashMap<S, HashMap<E::Id, Transition<S, C, E>>>,
}

impl<S, C, E> MachineConfig<S, C, E>
where
    S: Copy + Eq + Hash + fmt::Display,
    E: MachineEvent,
{
    /// Start a table with the given initial state and context.
    pub fn new(initial: S, context: C) -> Self {
        Self {
            initial,
            context,
            states: HashMap::new(),
        }
    }

    /// Register the transition taken from `state` on `event`.
    ///
    /// Registering the same `(state, event)` pair twice replaces the
    /// earlier entry.
    pub fn on(mut self, state: S, event: E::Id, transition: Transition<S, C, E>) -> Self {
        self.states.entry(state).or_default().insert(event, transition);
        self
    }

    /// The transition registered for `(state, event)`, if any.
    pub fn transition(&self, state: S, event: E::Id) -> Option<&Transition<S, C, E>> {
        self.states.get(&state).and_then(|on| on.get(&event))
    }

    /// Event ids accepted in `state`.
    pub fn events_from(&self, state: S) -> Vec<E::Id> {
        self.states
            .get(&state)
            .map(|on| on.keys().copied().collect())
            .unwrap_or_default()
    }
}

// -- Machine ------------------------------------------------------------------

/// A running state machine instance.
pub struct Machine<S, C, E: MachineEvent> {
    state: S,
    context: C,
    states: HashMap<S, HashMap<E::Id, Transition<S, C, E>>>,
    history: Vec<TransitionRecord<S, E::Id>>,
}

impl<S, C, E> Machine<S, C, E>
where
    S: Copy + Eq + Hash + fmt::Display,
    E: MachineEvent,
{
    /// Instantiate a machine in its configured initial state.
    pub fn new(config: MachineConfig<S, C, E>) -> Self {
        Self {
            state: config.initial,
            context: config.context,
            states: config.states,
            history: Vec::new(),
        }
    }

    /// Deliver an event. Returns the new current state.
    pub fn send(&mut self, event: E) -> Result<S, MachineError> {
        let id = event.id();
        let transition = self
            .states
            .get(&self.state)
            .and_then(|on| on.get(&id))
            .ok_or_else(|| MachineError::InvalidTransition {
                state: self.state.to_string(),
                event: id.to_string(),
            })?;

        for action in &transition.actions {
            action(&mut self.context, &event);
        }

        let from = self.state;
        self.state = transition.target;
        self.history.push(TransitionRecord {
            from,
            to: self.state,
            event: id,
        });
        Ok(self.state)
    }

    /// The current state.
    pub fn current(&self) -> S {
        self.state
    }

    /// The context as left by the last transition's actions.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Whether the current state accepts `event`.
    pub fn can(&self, event: E::Id) -> bool {
        self.states
            .get(&self.state)
            .is_some_and(|on| on.contains_key(&event))
    }

    /// Every transition taken so far, oldest first.
    pub fn history(&self) -> &[TransitionRecord<S, E::Id>] {
        &self.history
    }
}

impl<S: fmt::Debug, C: fmt::Debug, E: MachineEvent> fmt::Debug for Machine<S, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("context", &self.context)
            .field("transitions", &self.history.len())
            .finish()
    }
}
