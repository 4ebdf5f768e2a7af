//! Drivers that pump a machine with externally supplied input.
//!
//! [`run`] and [`run_with`] resume a machine until it terminates or a
//! callback halts the loop. [`Stepper`] does the same one round at a time,
//! pulling events from a lazy sequence. In every mode a halted or exhausted
//! drive hands back the next input, and feeding it to a new drive continues
//! the machine exactly where it paused: the machine itself is never torn
//! down by pausing.

use log::debug;

use crate::state::Resumable;
use crate::{Error, Outcome, Step, Yielded};

/// What a driver callback wants to happen next.
#[derive(Debug, Clone, PartialEq)]
pub enum Control<C, S, E> {
    /// Resume with exactly this input
    Continue(Step<C, S, E>),
    /// Resume with this input, taking its event from the event sequence
    /// when there is one
    NextEvent(Step<C, S, E>),
    /// Stop driving; the step is what the next drive should start from
    Halt(Step<C, S, E>),
}

/// How a drive ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Run<C, S, E> {
    /// Paused by a callback or by running out of events; the machine is
    /// still live and this is its next input
    Halted(Step<C, S, E>),
    /// The machine reached its final state; this is the last input it saw,
    /// carrying the context it handed back
    Terminated(Step<C, S, E>),
}

impl<C, S, E> Run<C, S, E> {
    /// Whether the machine terminated.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Run::Terminated(_))
    }

    /// Borrow the context.
    pub fn context(&self) -> &C {
        match self {
            Run::Halted(step) | Run::Terminated(step) => &step.context,
        }
    }

    /// The value to resume from.
    pub fn into_step(self) -> Step<C, S, E> {
        match self {
            Run::Halted(step) | Run::Terminated(step) => step,
        }
    }
}

/// Resume `machine` until it terminates, feeding each output back as the
/// next input.
pub async fn run<R, C, S, E>(
    machine: &mut R,
    initial: Step<C, S, E>,
) -> Result<Run<C, S, E>, Error<S>>
where
    R: Resumable<C, S, E> + ?Sized,
    S: Clone,
    E: Clone,
{
    run_with(machine, initial, |_, out| Control::Continue(out.into_step())).await
}

/// Resume `machine` until it terminates or `callback` halts.
///
/// The callback sees the machine and its latest output and decides the
/// next input.
pub async fn run_with<R, C, S, E, F>(
    machine: &mut R,
    initial: Step<C, S, E>,
    mut callback: F,
) -> Result<Run<C, S, E>, Error<S>>
where
    R: Resumable<C, S, E> + ?Sized,
    S: Clone,
    E: Clone,
    F: FnMut(&R, Yielded<C, S, E>) -> Control<C, S, E>,
{
    let mut step = initial;
    loop {
        let (state, event) = (step.state.clone(), step.event.clone());
        match machine.resume(step).await? {
            Outcome::Done(context) => {
                debug!("run terminated");
                return Ok(Run::Terminated(Step::new(context, state, event)));
            }
            Outcome::Suspended(out) => match callback(&*machine, out) {
                Control::Continue(next) | Control::NextEvent(next) => step = next,
                Control::Halt(next) => {
                    debug!("run halted by callback");
                    return Ok(Run::Halted(next));
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drive {
    Running,
    Halted,
    Terminated,
    Failed,
}

/// Step-by-step driver fed from a lazy event sequence.
///
/// Each call to [`Stepper::next`] resumes the machine once and returns the
/// input prepared for the following round. Before that round the next event
/// is pulled from the sequence, unless a value was [injected](Stepper::inject)
/// or the callback asked for an exact input with [`Control::Continue`].
///
/// ```rust,no_run
/// # use coro_hsm::{Dispatcher, Step, Stepper};
/// # async fn example(machine: &mut Dispatcher<(), &'static str, char>) {
/// let mut stepper = Stepper::new(machine, Step::start(())).events("nnn".chars());
/// while let Some(Ok(step)) = stepper.next().await {
///     println!("next input: {:?}", step.event);
/// }
/// # }
/// ```
pub struct Stepper<'m, R: ?Sized, C, S, E> {
    machine: &'m mut R,
    events: Option<Box<dyn Iterator<Item = E> + 'm>>,
    #[allow(clippy::type_complexity)]
    callback: Option<Box<dyn FnMut(&R, Yielded<C, S, E>) -> Control<C, S, E> + 'm>>,
    pending: Option<Step<C, S, E>>,
    injected: Option<Step<C, S, E>>,
    pull: bool,
    drive: Drive,
}

impl<'m, R, C, S, E> Stepper<'m, R, C, S, E>
where
    R: Resumable<C, S, E> + ?Sized,
    S: Clone,
    E: Clone,
{
    /// Drive `machine` starting from `initial`.
    pub fn new(machine: &'m mut R, initial: Step<C, S, E>) -> Self {
        Self {
            machine,
            events: None,
            callback: None,
            pending: Some(initial),
            injected: None,
            pull: false,
            drive: Drive::Running,
        }
    }

    /// Take events from `events`, consumed one per round.
    pub fn events<I>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = E>,
        I::IntoIter: 'm,
    {
        self.events = Some(Box::new(events.into_iter()));
        self
    }

    /// Run `callback` on every output.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&R, Yielded<C, S, E>) -> Control<C, S, E> + 'm,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Use `step` as the next input instead of pulling an event.
    pub fn inject(&mut self, step: Step<C, S, E>) {
        self.injected = Some(step);
    }

    /// Whether the machine reached its final state.
    pub fn is_terminated(&self) -> bool {
        self.drive == Drive::Terminated
    }

    /// Resume once. `None` once the machine terminated, the callback
    /// halted, or the event sequence ran out.
    pub async fn next(&mut self) -> Option<Result<&Step<C, S, E>, Error<S>>> {
        if self.drive != Drive::Running {
            return None;
        }

        let pull = self.pull;
        let step = match self.injected.take() {
            Some(step) => step,
            None => {
                let step = self.pending.take()?;
                match self.events.as_mut().filter(|_| pull) {
                    Some(events) => match events.next() {
                        Some(event) => step.with_event(event),
                        None => {
                            debug!("event sequence exhausted");
                            self.pending = Some(step);
                            self.drive = Drive::Halted;
                            return None;
                        }
                    },
                    None => step,
                }
            }
        };

        let (state, event) = (step.state.clone(), step.event.clone());
        let out = match self.machine.resume(step).await {
            Ok(Outcome::Suspended(out)) => out,
            Ok(Outcome::Done(context)) => {
                debug!("machine terminated");
                self.pending = Some(Step::new(context, state, event));
                self.drive = Drive::Terminated;
                return None;
            }
            Err(e) => {
                self.drive = Drive::Failed;
                return Some(Err(e));
            }
        };

        let control = match self.callback.as_mut() {
            Some(callback) => callback(&*self.machine, out),
            None => Control::NextEvent(out.into_step()),
        };

        match control {
            Control::Continue(next) => {
                self.pull = false;
                self.pending = Some(next);
            }
            Control::NextEvent(next) => {
                self.pull = true;
                self.pending = Some(next);
            }
            Control::Halt(next) => {
                debug!("stepping halted by callback");
                self.pending = Some(next);
                self.drive = Drive::Halted;
                return None;
            }
        }

        self.pending.as_ref().map(Ok)
    }

    /// Stop stepping and hand back the value to resume from.
    ///
    /// `None` if a fault consumed the pending input.
    pub fn finish(self) -> Option<Run<C, S, E>> {
        let terminated = self.drive == Drive::Terminated;
        self.pending.map(|step| {
            if terminated {
                Run::Terminated(step)
            } else {
                Run::Halted(step)
            }
        })
    }
}
