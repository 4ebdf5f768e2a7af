//! The resumable state contract and the leaf adapter built on it.

use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;

use crate::{Error, Outcome, Step, Yielded};

/// A suspendable unit of behavior.
///
/// Every resumption takes one [`Step`] and either suspends with a
/// [`Yielded`] value or signals completion with [`Outcome::Done`].
/// [`Dispatcher`](crate::Dispatcher) implements this trait too, which is
/// what lets whole machines act as states of a parent machine.
#[async_trait]
pub trait Resumable<C, S, E>: Send {
    /// Resume with the next step value.
    ///
    /// The first call after creation runs the entry action.
    async fn resume(&mut self, step: Step<C, S, E>) -> Result<Outcome<C, S, E>, Error<S>>;

    /// Run the exit action. Owners call this exactly once.
    fn close(&mut self);
}

/// Owned, type-erased state instance.
pub type BoxedState<C, S, E> = Box<dyn Resumable<C, S, E>>;

#[async_trait]
impl<C, S, E, R> Resumable<C, S, E> for Box<R>
where
    C: Send + 'static,
    S: Send + 'static,
    E: Send + 'static,
    R: Resumable<C, S, E> + ?Sized,
{
    async fn resume(&mut self, step: Step<C, S, E>) -> Result<Outcome<C, S, E>, Error<S>> {
        (**self).resume(step).await
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Response type for leaf handlers, indicating how to proceed after entering
/// a state or handling an event.
#[derive(Debug)]
pub enum Response<E> {
    /// Suspend, passing the incoming event through
    Handled,
    /// Suspend, replacing the event
    Emit(Option<E>),
    /// Nothing further to do for this event
    Done,
    /// An error occurred, with a message
    Error(String),
}

/// Callback-style leaf state.
///
/// Wrap an implementation in [`Leaf`] to get a [`Resumable`].
#[async_trait]
pub trait Stateful<C, S, E>: Send {
    /// Called on the first resumption after the state was created.
    ///
    /// # Arguments
    /// * `context` - Mutable reference to the shared context.
    /// * `id` - Identifier the state was entered under.
    /// * `event` - Event that caused the transition, if any.
    async fn on_enter(&mut self, context: &mut C, id: &S, event: Option<&E>) -> Response<E>;

    /// Called on every later resumption.
    async fn on_event(&mut self, context: &mut C, id: &S, event: Option<&E>) -> Response<E>;

    /// Called once when the state is left or torn down.
    fn on_exit(&mut self, _id: &S) {}
}

/// Adapter turning a [`Stateful`] into a [`Resumable`].
///
/// A leaf contributes no path element of its own: the dispatcher that owns
/// it appends the identifier it was entered under, so a path always has one
/// element per nesting level.
pub struct Leaf<S, T> {
    id: S,
    handler: T,
    entered: bool,
    closed: bool,
}

impl<S, T> Leaf<S, T> {
    /// Bind `handler` to the identifier it was entered under.
    pub fn new(id: S, handler: T) -> Self {
        Self {
            id,
            handler,
            entered: false,
            closed: false,
        }
    }

    /// Borrow the wrapped handler.
    pub fn handler(&self) -> &T {
        &self.handler
    }
}

#[async_trait]
impl<C, S, E, T> Resumable<C, S, E> for Leaf<S, T>
where
    C: Send + 'static,
    S: Clone + Debug + Send + Sync + 'static,
    E: Send + Sync + 'static,
    T: Stateful<C, S, E>,
{
    async fn resume(&mut self, step: Step<C, S, E>) -> Result<Outcome<C, S, E>, Error<S>> {
        let Step {
            mut context, event, ..
        } = step;

        if self.closed {
            return Err(Error::Closed);
        }

        let response = if self.entered {
            self.handler
                .on_event(&mut context, &self.id, event.as_ref())
                .await
        } else {
            self.entered = true;
            self.handler
                .on_enter(&mut context, &self.id, event.as_ref())
                .await
        };

        let event = match response {
            Response::Handled => event,
            Response::Emit(replacement) => replacement,
            Response::Done => return Ok(Outcome::Done(context)),
            Response::Error(e) => return Err(Error::StateInvalid(self.id.clone(), e)),
        };

        // the owning dispatcher appends the id this leaf was entered under
        Ok(Outcome::Suspended(Yielded {
            context,
            path: Vec::new(),
            event,
        }))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("exit {:?}", self.id);
        self.handler.on_exit(&self.id);
    }
}
