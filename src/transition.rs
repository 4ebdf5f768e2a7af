//! Transition functions: pick the next state identifier.
//!
//! A transition function is consulted with the current identifier (absent
//! before the machine has entered anything) and the latest event (absent
//! during internal re-evaluation). It answers with:
//!
//! - the same identifier: stay and forward the event,
//! - a different identifier: leave the current state and enter that one,
//! - `None`: the machine has reached its final state.

use std::fmt;

/// Decides which state comes next. Must not have side effects on the
/// dispatcher; reading the context is fine.
pub trait Transition<C, S, E>: Send {
    /// Next state for `(current, event)`, or `None` to terminate.
    fn next(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S>;
}

impl<C, S, E, T> Transition<C, S, E> for Box<T>
where
    T: Transition<C, S, E> + ?Sized,
{
    fn next(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S> {
        (**self).next(context, current, event)
    }
}

/// Adapts a closure into a [`Transition`].
pub struct FnTransition<F>(pub F);

impl<C, S, E, F> Transition<C, S, E> for FnTransition<F>
where
    F: Fn(&C, Option<&S>, Option<&E>) -> Option<S> + Send,
{
    fn next(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S> {
        (self.0)(context, current, event)
    }
}

/// Which current state a rule applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Source<S> {
    /// Nothing is active yet
    Initial,
    /// A specific state is active
    State(S),
    /// Any state, including none
    Any,
}

impl<S: PartialEq> Source<S> {
    fn matches(&self, current: Option<&S>) -> bool {
        match self {
            Source::Initial => current.is_none(),
            Source::State(s) => current == Some(s),
            Source::Any => true,
        }
    }
}

/// Condition over the event (and context) a rule requires.
pub enum Guard<C, E> {
    /// Matches every event, including none
    Always,
    /// Matches only the absent event
    Absent,
    /// Matches one event
    Is(E),
    /// Matches any event from a set
    OneOf(Vec<E>),
    /// Matches when the predicate holds
    Predicate(Box<dyn Fn(&C, Option<&E>) -> bool + Send + Sync>),
}

impl<C, E: PartialEq> Guard<C, E> {
    /// Build a predicate guard from a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&C, Option<&E>) -> bool + Send + Sync + 'static,
    {
        Guard::Predicate(Box::new(f))
    }

    /// Check the guard against an event.
    pub fn check(&self, context: &C, event: Option<&E>) -> bool {
        match self {
            Guard::Always => true,
            Guard::Absent => event.is_none(),
            Guard::Is(e) => event == Some(e),
            Guard::OneOf(set) => event.map_or(false, |e| set.contains(e)),
            Guard::Predicate(f) => f(context, event),
        }
    }
}

impl<C, E: fmt::Debug> fmt::Debug for Guard<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Always => write!(f, "*"),
            Guard::Absent => write!(f, "<none>"),
            Guard::Is(e) => write!(f, "{:?}", e),
            Guard::OneOf(set) => write!(f, "{:?}", set),
            Guard::Predicate(_) => write!(f, "<predicate>"),
        }
    }
}

/// One guarded transition rule.
#[derive(Debug)]
pub struct Rule<C, S, E> {
    /// Current state the rule applies to
    pub source: Source<S>,
    /// Event condition
    pub guard: Guard<C, E>,
    /// Next state, `None` to terminate
    pub target: Option<S>,
}

/// Ordered list of guarded rules, evaluated first match wins.
///
/// When no rule matches, the table answers with the current identifier
/// (stay). Before anything is active that means `None`, so a table without
/// an [`Source::Initial`] rule terminates on the first step.
///
/// ```rust
/// use coro_hsm::TransitionTable;
///
/// let table: TransitionTable<(), &str, char> = TransitionTable::new()
///     .start("s1")
///     .on("s1", 'n', "s2")
///     .on("s2", 'n', None);
/// # let _ = table;
/// ```
pub struct TransitionTable<C, S, E> {
    rules: Vec<Rule<C, S, E>>,
}

impl<C, S, E> Default for TransitionTable<C, S, E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C, S, E> TransitionTable<C, S, E>
where
    S: Clone + PartialEq,
    E: PartialEq,
{
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    pub fn rule(
        mut self,
        source: Source<S>,
        guard: Guard<C, E>,
        target: impl Into<Option<S>>,
    ) -> Self {
        self.rules.push(Rule {
            source,
            guard,
            target: target.into(),
        });
        self
    }

    /// Initial state, entered whatever the first event is.
    pub fn start(self, target: S) -> Self {
        self.rule(Source::Initial, Guard::Always, target)
    }

    /// `(from, event) -> target`
    pub fn on(self, from: S, event: E, target: impl Into<Option<S>>) -> Self {
        self.rule(Source::State(from), Guard::Is(event), target)
    }

    /// `(from, any of events) -> target`
    pub fn on_any(
        self,
        from: S,
        events: impl IntoIterator<Item = E>,
        target: impl Into<Option<S>>,
    ) -> Self {
        let set = events.into_iter().collect();
        self.rule(Source::State(from), Guard::OneOf(set), target)
    }

    /// `(from, no event) -> target`: where a state goes once it signals
    /// completion.
    pub fn on_done(self, from: S, target: impl Into<Option<S>>) -> Self {
        self.rule(Source::State(from), Guard::Absent, target)
    }

    /// `(from, event matching predicate) -> target`
    pub fn when<F>(self, from: S, predicate: F, target: impl Into<Option<S>>) -> Self
    where
        F: Fn(&C, Option<&E>) -> bool + Send + Sync + 'static,
    {
        self.rule(Source::State(from), Guard::predicate(predicate), target)
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule<C, S, E>] {
        &self.rules
    }

    /// Evaluate the rules.
    pub fn lookup(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S> {
        self.rules
            .iter()
            .find(|rule| rule.source.matches(current) && rule.guard.check(context, event))
            .map_or_else(|| current.cloned(), |rule| rule.target.clone())
    }
}

impl<C, S, E> Transition<C, S, E> for TransitionTable<C, S, E>
where
    S: Clone + PartialEq + Send,
    E: PartialEq + Send,
    C: Send,
{
    fn next(&self, context: &C, current: Option<&S>, event: Option<&E>) -> Option<S> {
        self.lookup(context, current, event)
    }
}
