//! Traffic light example
//!
//! The junction has two modes:
//! - Normal: a nested machine cycling Red, Green and Yellow on timer ticks
//! - Flashing: a single blinking state used while a fault is being repaired
//!
//! Signals are queued in the context and fed back by the driver callback,
//! and the observed transitions of the junction are exported as PlantUML.
//!
//! Run with: cargo run --example traffic_light --features plantuml

use coro_hsm::prelude::*;
use coro_hsm::{Guard, Registry, Source};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Light {
    Normal,
    Flashing,
    Red,
    Green,
    Yellow,
}

#[derive(Debug, Clone, PartialEq)]
enum Signal {
    Tick,
    Fault,
    Repair,
    Shutdown,
}

#[derive(Debug)]
struct Junction {
    queue: VecDeque<Signal>,
    green_ticks: u32,
    cycles: u32,
}

impl Junction {
    fn new(signals: impl IntoIterator<Item = Signal>) -> Self {
        Self {
            queue: signals.into_iter().collect(),
            green_ticks: 0,
            cycles: 0,
        }
    }
}

struct Lamp;

#[async_trait]
impl Stateful<Junction, Light, Signal> for Lamp {
    async fn on_enter(
        &mut self,
        junction: &mut Junction,
        light: &Light,
        _signal: Option<&Signal>,
    ) -> Response<Signal> {
        match light {
            Light::Red => {
                junction.cycles += 1;
                println!("🔴 Red (cycle {})", junction.cycles);
            }
            Light::Green => {
                junction.green_ticks = 0;
                println!("🟢 Green");
            }
            Light::Yellow => println!("🟡 Yellow"),
            other => return Response::Error(format!("{:?} is not a lamp", other)),
        }
        Response::Handled
    }

    async fn on_event(
        &mut self,
        junction: &mut Junction,
        light: &Light,
        signal: Option<&Signal>,
    ) -> Response<Signal> {
        if *light == Light::Green && signal == Some(&Signal::Tick) {
            junction.green_ticks += 1;
        }
        Response::Handled
    }
}

struct Blinker;

#[async_trait]
impl Stateful<Junction, Light, Signal> for Blinker {
    async fn on_enter(
        &mut self,
        _junction: &mut Junction,
        _light: &Light,
        signal: Option<&Signal>,
    ) -> Response<Signal> {
        println!("⚠️  Flashing yellow after {:?}", signal);
        Response::Handled
    }

    async fn on_event(
        &mut self,
        _junction: &mut Junction,
        _light: &Light,
        _signal: Option<&Signal>,
    ) -> Response<Signal> {
        println!("⚠️  ...blink");
        Response::Handled
    }

    fn on_exit(&mut self, _light: &Light) {
        println!("🔧 Blinker off");
    }
}

fn cycle() -> Dispatcher<Junction, Light, Signal> {
    let table = TransitionTable::new()
        .start(Light::Red)
        .on(Light::Red, Signal::Tick, Light::Green)
        .when(
            Light::Green,
            |junction: &Junction, signal: Option<&Signal>| {
                signal == Some(&Signal::Tick) && junction.green_ticks >= 2
            },
            Light::Yellow,
        )
        .on(Light::Yellow, Signal::Tick, Light::Red);

    let mut lamps: Registry<Junction, Light, Signal> = Registry::new();
    for light in [Light::Red, Light::Green, Light::Yellow] {
        lamps.leaf(light, || Lamp);
    }

    Dispatcher::new(table, lamps)
        .with_name("cycle")
        .on_exit(|| println!("⏹️  Cycle stopped"))
}

fn create_junction() -> Result<Dispatcher<Junction, Light, Signal>, Error<Light>> {
    Dispatcher::builder()
        .name("junction")
        .table(
            TransitionTable::new()
                .rule(Source::Any, Guard::Is(Signal::Shutdown), None)
                .start(Light::Normal)
                .on(Light::Normal, Signal::Fault, Light::Flashing)
                .on(Light::Flashing, Signal::Repair, Light::Normal),
        )
        .state(
            Light::Normal,
            |_: &Junction, _: &Light, _: Option<&Signal>| cycle(),
        )
        .leaf(Light::Flashing, || Blinker)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🚦 Traffic Light Example");
    println!("========================\n");

    let mut junction = create_junction()?;
    let signals = [
        Signal::Tick,
        Signal::Tick,
        Signal::Tick,
        Signal::Tick,
        Signal::Tick,
        Signal::Fault,
        Signal::Tick,
        Signal::Repair,
        Signal::Tick,
        Signal::Shutdown,
    ];

    let run = run_with(
        &mut junction,
        Step::start(Junction::new(signals)),
        |machine, mut out: Yielded<Junction, Light, Signal>| {
            println!("   at {:?} (mode {:?})", out.path, machine.current_state());
            match out.context.queue.pop_front() {
                Some(signal) => Control::Continue(out.with_event(signal)),
                None => Control::Halt(out.into_step()),
            }
        },
    )
    .await?;

    println!(
        "\n📊 Terminated: {} after {} cycles",
        run.is_terminated(),
        run.context().cycles
    );

    println!("\n📈 Junction diagram:\n{}", junction.export_plantuml());

    println!("🏁 Traffic light example completed!");
    Ok(())
}
