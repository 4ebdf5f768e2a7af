//! Pocket calculator example
//!
//! Two levels of machines:
//! - Power: `off` and `on`
//! - Keypad: the `on` state, rebuilt on every power-up, reading
//!   `operand1 operator operand2 =` sequences
//!
//! Each key is fed through a [`Stepper`]; the display is part of the
//! context, so the whole session is visible once the keys run out.
//!
//! Run with: RUST_LOG=debug cargo run --example calculator

use coro_hsm::prelude::*;
use coro_hsm::{BoxedState, Blueprint, Leaf};

type Key = &'static str;

#[derive(Debug, Default)]
struct Display {
    shown: Vec<String>,
    acc: i64,
    operand: i64,
    op: Option<Key>,
}

impl Display {
    fn show(&mut self, value: impl ToString) {
        let value = value.to_string();
        println!("🖩  {:>6}", value);
        self.shown.push(value);
    }
}

fn digit(key: Option<&Key>) -> Option<i64> {
    key.and_then(|k| k.parse().ok())
}

fn is_operator(key: Option<&Key>) -> bool {
    matches!(key, Some(&"+") | Some(&"-"))
}

struct Blank;

#[async_trait]
impl Stateful<Display, Key, Key> for Blank {
    async fn on_enter(&mut self, _: &mut Display, _: &Key, _: Option<&Key>) -> Response<Key> {
        println!("📴 powered off");
        Response::Handled
    }

    async fn on_event(&mut self, _: &mut Display, _: &Key, _: Option<&Key>) -> Response<Key> {
        Response::Handled
    }
}

/// Accumulates digits into the accumulator or the second operand.
struct Number {
    second: bool,
}

impl Number {
    fn slot<'a>(&self, display: &'a mut Display) -> &'a mut i64 {
        if self.second {
            &mut display.operand
        } else {
            &mut display.acc
        }
    }
}

#[async_trait]
impl Stateful<Display, Key, Key> for Number {
    async fn on_enter(&mut self, display: &mut Display, _: &Key, key: Option<&Key>) -> Response<Key> {
        let value = digit(key).unwrap_or(0);
        *self.slot(display) = value;
        display.show(value);
        Response::Handled
    }

    async fn on_event(&mut self, display: &mut Display, _: &Key, key: Option<&Key>) -> Response<Key> {
        if let Some(d) = digit(key) {
            let slot = self.slot(display);
            *slot = *slot * 10 + d;
            let value = *slot;
            display.show(value);
        }
        Response::Handled
    }
}

struct Operator;

#[async_trait]
impl Stateful<Display, Key, Key> for Operator {
    async fn on_enter(&mut self, display: &mut Display, _: &Key, key: Option<&Key>) -> Response<Key> {
        display.op = key.copied();
        display.show(key.copied().unwrap_or("?"));
        Response::Handled
    }

    async fn on_event(&mut self, _: &mut Display, _: &Key, _: Option<&Key>) -> Response<Key> {
        Response::Handled
    }
}

struct Equals;

#[async_trait]
impl Stateful<Display, Key, Key> for Equals {
    async fn on_enter(&mut self, display: &mut Display, _: &Key, _: Option<&Key>) -> Response<Key> {
        display.acc = match display.op {
            Some("+") => display.acc + display.operand,
            Some("-") => display.acc - display.operand,
            other => return Response::Error(format!("unknown operator {:?}", other)),
        };
        display.show(display.acc);
        Response::Handled
    }

    async fn on_event(&mut self, _: &mut Display, _: &Key, _: Option<&Key>) -> Response<Key> {
        Response::Done
    }
}

/// The keypad written as a single blueprint: one type supplies both the
/// transition function and the states.
struct Keypad;

impl Blueprint<Display, Key, Key> for Keypad {
    fn transition(&self, _: &Display, current: Option<&Key>, key: Option<&Key>) -> Option<Key> {
        let next = match (current.copied(), key) {
            (None, _) => "operand1",
            (Some("operand1"), k) if is_operator(k) => "operator",
            (Some("operator"), k) if digit(k).is_some() => "operand2",
            (Some("operand2"), Some(&"=")) => "result",
            (Some("result"), k) if is_operator(k) => "operator",
            (Some("result"), k) if digit(k).is_some() => "operand1",
            (Some("result"), None) => "operand1",
            (Some(state), _) => state,
        };
        Some(next)
    }

    fn create(
        &mut self,
        _: &Display,
        id: &Key,
        _: Option<&Key>,
    ) -> Result<BoxedState<Display, Key, Key>, Error<Key>> {
        let state: BoxedState<Display, Key, Key> = match *id {
            "operand1" => Box::new(Leaf::new(*id, Number { second: false })),
            "operand2" => Box::new(Leaf::new(*id, Number { second: true })),
            "operator" => Box::new(Leaf::new(*id, Operator)),
            "result" => Box::new(Leaf::new(*id, Equals)),
            other => return Err(Error::StateNotRegistered(other)),
        };
        Ok(state)
    }
}

fn create_calculator() -> Result<Dispatcher<Display, Key, Key>, Error<Key>> {
    Dispatcher::builder()
        .name("power")
        .table(
            TransitionTable::new()
                .start("off")
                .on("off", "p-on", "on")
                .on("on", "p-off", "off")
                .on("off", "unplug", None),
        )
        .factory_fn(|_: &Display, id: &Key, _: Option<&Key>| {
            let state: BoxedState<Display, Key, Key> = match *id {
                "off" => Box::new(Leaf::new(*id, Blank)),
                "on" => Box::new(
                    Dispatcher::<Display, Key, Key>::from_blueprint(Keypad).with_name("keypad"),
                ),
                other => return Err(Error::StateNotRegistered(other)),
            };
            Ok(state)
        })
        .on_exit(|| println!("🛑 unplugged"))
        .build()
}

async fn simulate_session() -> Result<(), Box<dyn std::error::Error>> {
    let mut calculator = create_calculator()?;
    let keys = [
        "p-on", "2", "+", "3", "=", "-", "1", "=", "p-on", "1", "2", "+", "3", "0", "=", "p-off",
        "unplug",
    ];

    let mut stepper = Stepper::new(&mut calculator, Step::start(Display::default()))
        .events(keys)
        .callback(|_, out: Yielded<Display, Key, Key>| {
            log::debug!("path {:?}", out.path);
            Control::NextEvent(out.into_step())
        });

    while let Some(step) = stepper.next().await {
        let step = step?;
        println!("⌨️  next input at {:?}", step.state);
    }

    match stepper.finish() {
        Some(Run::Terminated(step)) => {
            println!("\n📜 Session: {}", step.context.shown.join(" "));
        }
        Some(Run::Halted(step)) => {
            println!("\n⏸️  Keys ran out at {:?}", step.state);
        }
        None => println!("\n💥 Calculator faulted"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🧮 Pocket Calculator Example");
    println!("============================\n");

    simulate_session().await?;

    println!("\n🏁 Calculator example completed!");
    Ok(())
}
