//! Property-based tests for nesting and paths.
//!
//! Machines of random depth are driven with random event sequences; every
//! suspension must report one path element per level, innermost first.

use coro_hsm::{async_trait, Dispatcher, Outcome, Response, Resumable, Stateful, Step};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

type Id = &'static str;

struct Idle;

#[async_trait]
impl Stateful<(), Id, char> for Idle {
    async fn on_enter(&mut self, _: &mut (), _: &Id, _: Option<&char>) -> Response<char> {
        Response::Handled
    }

    async fn on_event(&mut self, _: &mut (), _: &Id, _: Option<&char>) -> Response<char> {
        Response::Handled
    }
}

// Toggle between "a" and "b" whenever `trigger` arrives
fn toggle(current: Option<&Id>, event: Option<&char>, trigger: char) -> Id {
    match (current.copied(), event) {
        (None, _) => "a",
        (Some("a"), Some(e)) if *e == trigger => "b",
        (Some("b"), Some(e)) if *e == trigger => "a",
        (Some(state), _) => state,
    }
}

// The innermost level toggles on 'x' and records what it chose, every outer
// level toggles on 'y' and builds a fresh machine one level shallower
fn nested(depth: usize, chosen: Arc<Mutex<Option<Id>>>) -> Dispatcher<(), Id, char> {
    if depth <= 1 {
        return Dispatcher::builder()
            .transition_fn(move |_: &(), current: Option<&Id>, event: Option<&char>| {
                let next = toggle(current, event, 'x');
                *chosen.lock().unwrap() = Some(next);
                Some(next)
            })
            .leaf("a", || Idle)
            .leaf("b", || Idle)
            .build()
            .unwrap();
    }

    let (for_a, for_b) = (Arc::clone(&chosen), chosen);
    Dispatcher::builder()
        .transition_fn(|_: &(), current: Option<&Id>, event: Option<&char>| {
            Some(toggle(current, event, 'y'))
        })
        .state("a", move |_: &(), _: &Id, _: Option<&char>| {
            nested(depth - 1, Arc::clone(&for_a))
        })
        .state("b", move |_: &(), _: &Id, _: Option<&char>| {
            nested(depth - 1, Arc::clone(&for_b))
        })
        .build()
        .unwrap()
}

prop_compose! {
    fn arbitrary_events()(events in prop::collection::vec(
        prop::sample::select(vec!['x', 'y', 'z']),
        0..30,
    )) -> Vec<char> {
        events
    }
}

// (path length, leaf of the path, id the innermost transition chose)
type Observation = (usize, Option<Id>, Option<Id>);

fn observe(depth: usize, events: Vec<char>) -> Vec<Observation> {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async move {
        let chosen = Arc::new(Mutex::new(None));
        let mut machine = nested(depth, Arc::clone(&chosen));
        let mut seen = Vec::new();

        let mut step = Step::start(());
        let mut events = events.into_iter();
        loop {
            let out = match machine.resume(step).await.unwrap() {
                Outcome::Suspended(out) => out,
                Outcome::Done(_) => break,
            };
            seen.push((out.depth(), out.leaf().copied(), *chosen.lock().unwrap()));
            match events.next() {
                Some(event) => step = out.with_event(event),
                None => break,
            }
        }
        seen
    })
}

proptest! {
    #[test]
    fn path_length_equals_nesting_depth(depth in 1usize..5, events in arbitrary_events()) {
        for (len, _, _) in observe(depth, events) {
            prop_assert_eq!(len, depth);
        }
    }

    #[test]
    fn path_starts_at_innermost_choice(depth in 1usize..5, events in arbitrary_events()) {
        for (_, leaf, chosen) in observe(depth, events) {
            prop_assert!(leaf.is_some());
            prop_assert_eq!(leaf, chosen);
        }
    }

    #[test]
    fn every_step_suspends(depth in 1usize..5, events in arbitrary_events()) {
        let expected = events.len() + 1;
        prop_assert_eq!(observe(depth, events).len(), expected);
    }
}
