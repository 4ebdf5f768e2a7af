//! Values exchanged at every suspension boundary.

/// Input handed to a state or machine on each resumption.
///
/// The context is moved in and handed back through the matching
/// [`Outcome`], so no state holds on to it across a suspension.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<C, S, E> {
    /// Application data shared by every active state
    pub context: C,
    /// Identifier of the receiving state as seen by its owner
    pub state: Option<S>,
    /// Stimulus for this step, absent for internal re-evaluation
    pub event: Option<E>,
}

impl<C, S, E> Step<C, S, E> {
    /// Build a step from its three parts.
    pub fn new(context: C, state: Option<S>, event: Option<E>) -> Self {
        Self {
            context,
            state,
            event,
        }
    }

    /// The `(context, absent, absent)` input used to start a machine.
    ///
    /// Only meaningful for an idle machine. An active machine reads the same
    /// value as a stop request, so resume a running one with
    /// [`Yielded::into_step`], [`Yielded::with_event`] or
    /// [`Run::into_step`](crate::Run::into_step) instead.
    pub fn start(context: C) -> Self {
        Self::new(context, None, None)
    }

    /// Ask a running machine to stop: the state component is absent.
    pub fn stop(context: C) -> Self {
        Self::new(context, None, None)
    }

    /// Replace the event, keeping context and state.
    pub fn with_event(self, event: impl Into<Option<E>>) -> Self {
        Self {
            event: event.into(),
            ..self
        }
    }
}

/// Output of a state that suspended.
///
/// `path` lists the active identifiers from the innermost state to the
/// outermost machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Yielded<C, S, E> {
    /// Context after the step
    pub context: C,
    /// Active identifiers, leaf first
    pub path: Vec<S>,
    /// Event emitted by the innermost state
    pub event: Option<E>,
}

impl<C, S: Clone, E> Yielded<C, S, E> {
    /// Innermost active identifier.
    pub fn leaf(&self) -> Option<&S> {
        self.path.first()
    }

    /// Outermost active identifier.
    pub fn root(&self) -> Option<&S> {
        self.path.last()
    }

    /// Number of nesting levels that contributed to the path.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Feed this output back as the next input.
    pub fn into_step(self) -> Step<C, S, E> {
        let state = self.path.last().cloned();
        Step::new(self.context, state, self.event)
    }

    /// Feed this output back with a different event.
    pub fn with_event(self, event: impl Into<Option<E>>) -> Step<C, S, E> {
        self.into_step().with_event(event)
    }
}

/// Result of one resumption.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<C, S, E> {
    /// Still active; here is the output for this step
    Suspended(Yielded<C, S, E>),
    /// Nothing further to do for the current event. Hands the context back.
    Done(C),
}

impl<C, S, E> Outcome<C, S, E> {
    /// Whether this is the completion signal.
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    /// Recover the context regardless of the variant.
    pub fn into_context(self) -> C {
        match self {
            Outcome::Suspended(yielded) => yielded.context,
            Outcome::Done(context) => context,
        }
    }
}
