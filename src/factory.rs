//! State factories: build a fresh state instance on entry.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::state::{BoxedState, Leaf, Resumable, Stateful};
use crate::Error;

/// Builds the state instance for an identifier being entered.
///
/// Called once per entry, never once per step. Unknown identifiers are a
/// configuration error and must be reported, not papered over.
pub trait Factory<C, S, E>: Send {
    /// Create the instance for `id`.
    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>>;
}

impl<C, S, E, F> Factory<C, S, E> for Box<F>
where
    F: Factory<C, S, E> + ?Sized,
{
    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>> {
        (**self).create(context, id, event)
    }
}

/// Adapts a closure into a [`Factory`].
pub struct FnFactory<F>(pub F);

impl<C, S, E, F> Factory<C, S, E> for FnFactory<F>
where
    F: FnMut(&C, &S, Option<&E>) -> Result<BoxedState<C, S, E>, Error<S>> + Send,
{
    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>> {
        (self.0)(context, id, event)
    }
}

type Constructor<C, S, E> = Box<dyn FnMut(&C, &S, Option<&E>) -> BoxedState<C, S, E> + Send>;

enum Entry<C, S, E> {
    Constructor(Constructor<C, S, E>),
    Instance(Option<BoxedState<C, S, E>>),
}

/// Factory backed by a map of registered states.
///
/// A state is either a constructor run on every entry, or a prebuilt
/// instance handed out once (used to chain machines that were built ahead
/// of time).
pub struct Registry<C, S, E> {
    entries: HashMap<S, Entry<C, S, E>>,
}

impl<C, S, E> Default for Registry<C, S, E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C, S, E> Registry<C, S, E>
where
    C: Send + 'static,
    S: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `id`.
    pub fn state<F, R>(&mut self, id: S, mut ctor: F)
    where
        F: FnMut(&C, &S, Option<&E>) -> R + Send + 'static,
        R: Resumable<C, S, E> + 'static,
    {
        let boxed: Constructor<C, S, E> = Box::new(move |ctx: &C, id: &S, evt: Option<&E>| {
            Box::new(ctor(ctx, id, evt)) as BoxedState<C, S, E>
        });
        self.entries.insert(id, Entry::Constructor(boxed));
    }

    /// Register a [`Stateful`] handler for `id`, built fresh on each entry.
    pub fn leaf<F, T>(&mut self, id: S, mut ctor: F)
    where
        F: FnMut() -> T + Send + 'static,
        T: Stateful<C, S, E> + 'static,
    {
        self.state(id, move |_: &C, id: &S, _: Option<&E>| Leaf::new(id.clone(), ctor()));
    }

    /// Register a prebuilt instance for `id`; it can be entered once.
    pub fn instance<R>(&mut self, id: S, state: R)
    where
        R: Resumable<C, S, E> + 'static,
    {
        self.entries.insert(id, Entry::Instance(Some(Box::new(state))));
    }

    /// Whether `id` is known.
    pub fn contains(&self, id: &S) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of registered identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &S> {
        self.entries.keys()
    }
}

impl<C, S, E> Factory<C, S, E> for Registry<C, S, E>
where
    C: Send,
    S: Clone + Debug + Eq + Hash + Send,
    E: Send,
{
    fn create(
        &mut self,
        context: &C,
        id: &S,
        event: Option<&E>,
    ) -> Result<BoxedState<C, S, E>, Error<S>> {
        match self.entries.get_mut(id) {
            Some(Entry::Constructor(ctor)) => Ok(ctor(context, id, event)),
            Some(Entry::Instance(slot)) => slot
                .take()
                .ok_or_else(|| Error::InstanceConsumed(id.clone())),
            None => Err(Error::StateNotRegistered(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Outcome, Response, Step};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Stateful<(), &'static str, char> for Echo {
        async fn on_enter(
            &mut self,
            _context: &mut (),
            _id: &&'static str,
            _event: Option<&char>,
        ) -> Response<char> {
            Response::Handled
        }

        async fn on_event(
            &mut self,
            _context: &mut (),
            _id: &&'static str,
            _event: Option<&char>,
        ) -> Response<char> {
            Response::Handled
        }
    }

    #[tokio::test]
    async fn test_constructor_builds_fresh_instances() {
        let mut registry: Registry<(), &'static str, char> = Registry::new();
        registry.leaf("echo", || Echo);

        for _ in 0..2 {
            let mut state = registry.create(&(), &"echo", None).unwrap();
            match state.resume(Step::new((), Some("echo"), Some('x'))).await.unwrap() {
                Outcome::Suspended(out) => {
                    assert!(out.path.is_empty());
                    assert_eq!(out.event, Some('x'));
                }
                Outcome::Done(_) => panic!("echo should suspend"),
            }
            state.close();
        }
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        let mut registry: Registry<(), &'static str, char> = Registry::new();
        let result = registry.create(&(), &"missing", None);
        assert!(matches!(result, Err(Error::StateNotRegistered("missing"))));
    }

    #[test]
    fn test_instance_is_handed_out_once() {
        let mut registry: Registry<(), &'static str, char> = Registry::new();
        registry.instance("once", Leaf::new("once", Echo));
        assert!(registry.contains(&"once"));
        assert_eq!(registry.len(), 1);

        assert!(registry.create(&(), &"once", None).is_ok());
        let again = registry.create(&(), &"once", None);
        assert!(matches!(again, Err(Error::InstanceConsumed("once"))));
    }
}
