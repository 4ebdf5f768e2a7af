//! The dispatch core: a state machine that is itself a state.
//!
//! A [`Dispatcher`] owns at most one active child state. On every resumption
//! it consults its transition function, enters a new child through its
//! factory when the identifier changes, forwards the step to the active
//! child and appends its own current identifier to the child's path before
//! suspending. Because it implements [`Resumable`], a dispatcher can be
//! handed out by the factory of a parent dispatcher, nesting machines to
//! any depth.
//!
//! # Completion
//! A child that answers [`Outcome::Done`] has nothing further to do for the
//! current event. The dispatcher then clears the event and consults the
//! transition function again before returning to its caller, so a state can
//! fall through to whatever `(state, no event)` maps to. Note this re-uses
//! the `(state, no event)` rule even when the original event had its own
//! rule.
//!
//! The re-evaluation always happens, so a state may change the context
//! before completing and let a context-guarded rule move the machine on.
//! Only when a state completes on an absent event and the transition
//! function then keeps it active does the dispatcher give up with
//! [`Error::Stalled`], since the state would see the very same input again.
//! A nested machine that terminated while its parent keeps it active is
//! reported the same way.
//!
//! # Teardown
//! The active child is closed exactly once: when it is left, when the
//! machine terminates or is stopped, when a fault unwinds through the
//! dispatcher, or when the dispatcher is dropped.

use async_trait::async_trait;
use log::{debug, trace};
use std::fmt::Debug;
use std::hash::Hash;

#[cfg(all(feature = "plantuml", debug_assertions))]
use std::collections::HashMap;

use crate::builder::DispatcherBuilder;
use crate::factory::Factory;
use crate::state::{BoxedState, Resumable};
use crate::transition::Transition;
use crate::{Error, Outcome, Step, Yielded};

/// A transition function and a factory supplied by one value.
///
/// Implement this on a type that describes a whole machine, then turn it
/// into a running machine with [`Dispatcher::from_blueprint`].
pub trait Blueprint<C, S, E>: Send {
    /// See [`Transition::next`].
    fn transition(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S>;

    /// See [`Factory::create`].
    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>>;
}

/// Separate transition function and factory joined into a [`Blueprint`].
pub struct Parts<T, F> {
    transition: T,
    factory: F,
}

impl<T, F> Parts<T, F> {
    /// Join a transition function and a factory.
    pub fn new(transition: T, factory: F) -> Self {
        Self {
            transition,
            factory,
        }
    }
}

impl<C, S, E, T, F> Blueprint<C, S, E> for Parts<T, F>
where
    T: Transition<C, S, E>,
    F: Factory<C, S, E>,
{
    fn transition(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S> {
        self.transition.next(context, current, event)
    }

    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>> {
        self.factory.create(context, id, event)
    }
}

/// Lifecycle of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not started, no active child
    Idle,
    /// A child state is active
    Active,
    /// Terminated or stopped; cannot be resumed
    Closed,
}

/// A suspendable, nestable state machine.
pub struct Dispatcher<C, S, E> {
    name: String,
    blueprint: Box<dyn Blueprint<C, S, E>>,
    current: Option<S>,
    child: Option<BoxedState<C, S, E>>,
    status: Status,
    exit_hook: Option<Box<dyn FnMut() + Send>>,

    // One record per unique (from, to) pair; `None` stands for the
    // initial and final pseudo-states.
    #[cfg(all(feature = "plantuml", debug_assertions))]
    transition_log: HashMap<(Option<S>, Option<S>), String>,
}

impl<C, S, E> Dispatcher<C, S, E>
where
    C: Send + 'static,
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Send + Sync + 'static,
{
    /// Create a dispatcher from a transition function and a factory.
    pub fn new<T, F>(transition: T, factory: F) -> Self
    where
        T: Transition<C, S, E> + 'static,
        F: Factory<C, S, E> + 'static,
    {
        Self::from_blueprint(Parts::new(transition, factory))
    }

    /// Create a dispatcher from a value that supplies both functions.
    pub fn from_blueprint<B>(blueprint: B) -> Self
    where
        B: Blueprint<C, S, E> + 'static,
    {
        Self {
            name: String::from("machine"),
            blueprint: Box::new(blueprint),
            current: None,
            child: None,
            status: Status::Idle,
            exit_hook: None,

            #[cfg(all(feature = "plantuml", debug_assertions))]
            transition_log: HashMap::new(),
        }
    }

    /// Start configuring a dispatcher.
    pub fn builder() -> DispatcherBuilder<C, S, E> {
        DispatcherBuilder::new()
    }

    /// Set the name used in log lines.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Run `hook` once when the machine closes after having been started,
    /// after its active child has been closed.
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.exit_hook = Some(Box::new(hook));
        self
    }

    /// Name used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle position.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the machine terminated or was stopped.
    pub fn is_closed(&self) -> bool {
        self.status == Status::Closed
    }

    /// Identifier of the active child, if any.
    pub fn current_state(&self) -> Option<&S> {
        match self.status {
            Status::Active => self.current.as_ref(),
            _ => None,
        }
    }

    /// Resume with `event`, addressing the machine by its current state.
    ///
    /// Unlike a raw [`Step`] this never reads as a stop request.
    pub async fn send(
        &mut self,
        context: C,
        event: impl Into<Option<E>> + Send,
    ) -> Result<Outcome<C, S, E>, Error<S>> {
        let step = Step::new(context, self.current.clone(), event.into());
        self.resume(step).await
    }

    // Log a transition (only in debug builds with plantuml feature)
    #[cfg(all(feature = "plantuml", debug_assertions))]
    fn log_transition(&mut self, from: Option<S>, to: Option<S>, event: Option<&E>) {
        let trigger = match event {
            Some(e) => format!("{:?}", e),
            None => String::new(),
        };
        self.transition_log.insert((from, to), trigger);
    }

    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    fn log_transition(&mut self, _from: Option<S>, _to: Option<S>, _event: Option<&E>) {
        // No-op when plantuml feature is disabled or in release builds
    }

    async fn dispatch(&mut self, step: Step<C, S, E>) -> Result<Outcome<C, S, E>, Error<S>> {
        let Step {
            mut context,
            state,
            mut event,
        } = step;

        if self.status == Status::Active && state.is_none() {
            debug!("[{}] stop requested in {:?}", self.name, self.current);
            self.shutdown();
            return Ok(Outcome::Done(context));
        }

        // state that last answered Done to an absent event in this round
        let mut done_without_event: Option<S> = None;

        loop {
            let current = self.current.clone();
            let Some(next) = self
                .blueprint
                .transition(&context, current.as_ref(), event.as_ref())
            else {
                debug!("[{}] final state reached from {:?}", self.name, current);
                self.log_transition(current, None, event.as_ref());
                self.shutdown();
                return Ok(Outcome::Done(context));
            };

            let entering = current.as_ref() != Some(&next);
            if entering {
                self.close_child();
                debug!("[{}] enter {:?} on {:?}", self.name, next, event);
                let child = self.blueprint.create(&context, &next, event.as_ref())?;
                self.log_transition(current, Some(next.clone()), event.as_ref());
                self.current = Some(next.clone());
                self.child = Some(child);
                self.status = Status::Active;
            } else if done_without_event.as_ref() == Some(&next) {
                // the same input would be presented to the same state again
                return Err(Error::Stalled(next));
            }

            let absorbed = event.is_none();
            let Some(child) = self.child.as_mut() else {
                return Err(Error::Closed);
            };

            let outcome = match child.resume(Step::new(context, Some(next.clone()), event)).await {
                // a nested machine that already finished was kept active
                Err(Error::Closed) => return Err(Error::Stalled(next)),
                outcome => outcome?,
            };

            match outcome {
                Outcome::Suspended(Yielded {
                    context,
                    mut path,
                    event,
                }) => {
                    path.push(next);
                    trace!("[{}] suspend at {:?} with {:?}", self.name, path, event);
                    return Ok(Outcome::Suspended(Yielded {
                        context,
                        path,
                        event,
                    }));
                }
                Outcome::Done(returned) => {
                    trace!("[{}] {:?} done, re-evaluating", self.name, next);
                    done_without_event = absorbed.then_some(next);
                    context = returned;
                    event = None;
                }
            }
        }
    }

    /// Render the transitions observed so far as a PlantUML state diagram.
    #[cfg(all(feature = "plantuml", debug_assertions))]
    pub fn export_plantuml(&self) -> String {
        crate::plantuml::generate_plantuml(&self.name, &self.transition_log, self.current_state())
    }

    /// Stub for export_plantuml when feature is disabled
    #[cfg(not(all(feature = "plantuml", debug_assertions)))]
    pub fn export_plantuml(&self) -> String {
        String::from("PlantUML export not available (requires 'plantuml' feature and debug build)")
    }
}

impl<C, S, E> Dispatcher<C, S, E> {
    fn close_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            child.close();
        }
    }

    fn shutdown(&mut self) {
        if self.status == Status::Closed {
            return;
        }
        let started = self.status == Status::Active;
        self.close_child();
        self.status = Status::Closed;
        if started {
            debug!("[{}] closed", self.name);
            if let Some(hook) = self.exit_hook.as_mut() {
                hook();
            }
        }
    }
}

#[async_trait]
impl<C, S, E> Resumable<C, S, E> for Dispatcher<C, S, E>
where
    C: Send + 'static,
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Send + Sync + 'static,
{
    async fn resume(&mut self, step: Step<C, S, E>) -> Result<Outcome<C, S, E>, Error<S>> {
        if self.status == Status::Closed {
            return Err(Error::Closed);
        }

        match self.dispatch(step).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                debug!("[{}] unwinding: {}", self.name, e);
                self.shutdown();
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.shutdown();
    }
}

impl<C, S, E> Drop for Dispatcher<C, S, E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
