//! Error types for the state machine

use thiserror::Error;

/// Result type alias for state machine operations
pub type Result<T, S> = std::result::Result<T, Error<S>>;

/// Errors that can occur while dispatching steps through a state machine.
///
/// The halt requested by a driver callback is not an error; see
/// [`Control::Halt`](crate::Control::Halt).
#[derive(Error, Debug)]
pub enum Error<S> {
    /// The factory was asked for a state it does not know how to build
    #[error("State {0:?} not registered")]
    StateNotRegistered(S),

    /// A one-shot state instance was entered a second time
    #[error("State {0:?} instance already consumed")]
    InstanceConsumed(S),

    /// State returned an error during processing
    #[error("State {0:?} error: {1}")]
    StateInvalid(S, String),

    /// A state completed on an absent event and the transition function
    /// kept it active, or a nested machine finished while its owner kept it
    #[error("State {0:?} completed and was not left")]
    Stalled(S),

    /// The machine reached its final state or was stopped
    #[error("State machine closed")]
    Closed,

    /// The builder was not given a transition function
    #[error("No transition function supplied")]
    MissingTransition,

    /// Generic error type for custom errors
    #[error("Custom error: {0}")]
    Custom(String),
}
