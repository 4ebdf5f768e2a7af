//! Builder pattern implementation for dispatchers

use crate::factory::{FnFactory, Registry};
use crate::state::{BoxedState, Resumable, Stateful};
use crate::transition::FnTransition;
use crate::{Dispatcher, Error, Factory, Transition, TransitionTable};
use std::fmt::Debug;
use std::hash::Hash;

/// Builder for constructing dispatchers
pub struct DispatcherBuilder<C, S, E> {
    name: Option<String>,
    transition: Option<Box<dyn Transition<C, S, E>>>,
    factory: Option<Box<dyn Factory<C, S, E>>>,
    registry: Registry<C, S, E>,
    exit_hook: Option<Box<dyn FnMut() + Send>>,
}

impl<C, S, E> Default for DispatcherBuilder<C, S, E> {
    fn default() -> Self {
        Self {
            name: None,
            transition: None,
            factory: None,
            registry: Registry::default(),
            exit_hook: None,
        }
    }
}

impl<C, S, E> DispatcherBuilder<C, S, E>
where
    C: Send + 'static,
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Debug + Send + Sync + 'static,
{
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used as the log prefix
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use any [`Transition`] implementation
    pub fn transition<T>(mut self, transition: T) -> Self
    where
        T: Transition<C, S, E> + 'static,
    {
        self.transition = Some(Box::new(transition));
        self
    }

    /// Use a closure as the transition function
    pub fn transition_fn<F>(self, func: F) -> Self
    where
        F: Fn(&C, Option<&S>, Option<&E>) -> Option<S> + Send + 'static,
    {
        self.transition(FnTransition(func))
    }

    /// Use a guarded rule table as the transition function
    pub fn table(self, table: TransitionTable<C, S, E>) -> Self
    where
        E: PartialEq,
    {
        self.transition(table)
    }

    /// Register a state constructor, run on every entry
    pub fn state<F, R>(mut self, state_id: S, ctor: F) -> Self
    where
        F: FnMut(&C, &S, Option<&E>) -> R + Send + 'static,
        R: Resumable<C, S, E> + 'static,
    {
        self.registry.state(state_id, ctor);
        self
    }

    /// Register a [`Stateful`] handler, built fresh on every entry
    pub fn leaf<F, T>(mut self, state_id: S, ctor: F) -> Self
    where
        F: FnMut() -> T + Send + 'static,
        T: Stateful<C, S, E> + 'static,
    {
        self.registry.leaf(state_id, ctor);
        self
    }

    /// Register a prebuilt state that can be entered once
    pub fn instance<R>(mut self, state_id: S, state: R) -> Self
    where
        R: Resumable<C, S, E> + 'static,
    {
        self.registry.instance(state_id, state);
        self
    }

    /// Replace the registry with a custom factory
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Factory<C, S, E> + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Replace the registry with a factory closure
    pub fn factory_fn<F>(self, func: F) -> Self
    where
        F: FnMut(&C, &S, Option<&E>) -> Result<BoxedState<C, S, E>, Error<S>> + Send + 'static,
    {
        self.factory(FnFactory(func))
    }

    /// Run `hook` once the machine closes, after its active child
    pub fn on_exit<F>(mut self, hook: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.exit_hook = Some(Box::new(hook));
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> Result<Dispatcher<C, S, E>, Error<S>> {
        let transition = self.transition.ok_or(Error::MissingTransition)?;
        let factory: Box<dyn Factory<C, S, E>> = match self.factory {
            Some(factory) => factory,
            None => Box::new(self.registry),
        };

        let mut dispatcher = Dispatcher::new(transition, factory);
        if let Some(name) = self.name {
            dispatcher = dispatcher.with_name(name);
        }
        if let Some(hook) = self.exit_hook {
            dispatcher = dispatcher.on_exit(hook);
        }
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Leaf, Outcome, Response, Step};
    use async_trait::async_trait;

    struct Idle;

    #[async_trait]
    impl Stateful<(), &'static str, u8> for Idle {
        async fn on_enter(
            &mut self,
            _context: &mut (),
            _id: &&'static str,
            _event: Option<&u8>,
        ) -> Response<u8> {
            Response::Handled
        }

        async fn on_event(
            &mut self,
            _context: &mut (),
            _id: &&'static str,
            event: Option<&u8>,
        ) -> Response<u8> {
            Response::Emit(event.map(|e| e + 1))
        }
    }

    #[test]
    fn test_missing_transition() {
        let result: Result<Dispatcher<(), &'static str, u8>, _> =
            DispatcherBuilder::new().leaf("idle", || Idle).build();
        assert!(matches!(result, Err(Error::MissingTransition)));
    }

    #[tokio::test]
    async fn test_builder_with_closures() {
        let mut fsm = DispatcherBuilder::new()
            .name("closures")
            .transition_fn(|_: &(), _: Option<&&'static str>, _: Option<&u8>| Some("idle"))
            .factory_fn(|_: &(), id: &&'static str, _: Option<&u8>| {
                Ok(Box::new(Leaf::new(*id, Idle)) as BoxedState<(), &'static str, u8>)
            })
            .build()
            .unwrap();
        assert_eq!(fsm.name(), "closures");

        fsm.resume(Step::start(())).await.unwrap();
        match fsm.send((), 41).await.unwrap() {
            Outcome::Suspended(out) => assert_eq!(out.event, Some(42)),
            Outcome::Done(_) => panic!("idle never completes"),
        }
    }

    #[tokio::test]
    async fn test_factory_replaces_registry() {
        let mut fsm = DispatcherBuilder::new()
            .table(TransitionTable::new().start("idle"))
            .leaf("other", || Idle)
            .factory_fn(|_: &(), id: &&'static str, _: Option<&u8>| {
                Err(Error::Custom(format!("refusing {}", id)))
            })
            .build()
            .unwrap();

        match fsm.resume(Step::start(())).await {
            Err(Error::Custom(msg)) => assert_eq!(msg, "refusing idle"),
            _ => panic!("Expected Custom error"),
        }
    }
}
