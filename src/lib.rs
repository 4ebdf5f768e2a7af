//! # Coro HSM
//!
//! Suspendable, hierarchical state machines that are driven one step value
//! at a time and nest to any depth.
//!
//! ## Features
//!
//! - 🔄 **Resumable States**: every state is an explicit `resume`/`close` object
//! - 🏗️ **Nesting**: a [`Dispatcher`] is itself a state, so whole machines are states of a parent
//! - 🧭 **Paths**: every suspension reports the active identifiers from leaf to root
//! - ⏸️ **Pause & Resume**: drivers hand back the exact next input when halted
//! - 📋 **Rule Tables**: ordered, guarded transition rules, first match wins
//! - 📊 **PlantUML Export**: observed transitions as a state diagram (debug builds only)
//!
//! ## Quick Start
//!
//! ```rust
//! use coro_hsm::prelude::*;
//!
//! struct Lamp;
//!
//! #[async_trait]
//! impl Stateful<u32, &'static str, &'static str> for Lamp {
//!     async fn on_enter(
//!         &mut self,
//!         switches: &mut u32,
//!         _id: &&'static str,
//!         _event: Option<&&'static str>,
//!     ) -> Response<&'static str> {
//!         *switches += 1;
//!         Response::Handled
//!     }
//!
//!     async fn on_event(
//!         &mut self,
//!         _switches: &mut u32,
//!         _id: &&'static str,
//!         _event: Option<&&'static str>,
//!     ) -> Response<&'static str> {
//!         Response::Handled
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut lamp = Dispatcher::builder()
//!     .table(
//!         TransitionTable::new()
//!             .start("off")
//!             .on("off", "toggle", "on")
//!             .on("on", "toggle", "off")
//!             .on("on", "unplug", None),
//!     )
//!     .leaf("off", || Lamp)
//!     .leaf("on", || Lamp)
//!     .build()?;
//!
//! let events = vec!["toggle", "toggle", "toggle", "unplug"];
//! let mut stepper = Stepper::new(&mut lamp, Step::start(0)).events(events);
//! while let Some(step) = stepper.next().await {
//!     println!("{:?}", step?.state);
//! }
//! let finished = stepper.finish().expect("no fault");
//! assert!(finished.is_terminated());
//! assert_eq!(*finished.context(), 4);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub use async_trait::async_trait;

mod builder;
mod dispatcher;
mod driver;
mod error;
mod factory;
mod state;
mod step;
mod transition;

#[cfg(all(feature = "plantuml", debug_assertions))]
mod plantuml;

pub use builder::DispatcherBuilder;
pub use dispatcher::{Blueprint, Dispatcher, Parts, Status};
pub use driver::{run, run_with, Control, Run, Stepper};
pub use error::{Error, Result};
pub use factory::{Factory, FnFactory, Registry};
pub use state::{BoxedState, Leaf, Resumable, Response, Stateful};
pub use step::{Outcome, Step, Yielded};
pub use transition::{FnTransition, Guard, Rule, Source, Transition, TransitionTable};

pub mod prelude {
    //! Prelude module for convenient imports
    pub use crate::{
        run, run_with, Control, Dispatcher, Error, Outcome, Resumable, Response, Run, Stateful,
        Step, Stepper, TransitionTable, Yielded,
    };
    pub use async_trait::async_trait;
}
