//! PlantUML diagram generation

use std::collections::HashMap;
use std::fmt::{Debug, Write};

/// Render the observed transitions of one machine level.
///
/// `None` on either side of a key is the initial or final pseudo-state.
pub fn generate_plantuml<S>(
    name: &str,
    transition_log: &HashMap<(Option<S>, Option<S>), String>,
    current_state: Option<&S>,
) -> String
where
    S: Debug,
{
    let mut plantuml = String::new();
    plantuml.push_str("@startuml\n");
    plantuml.push_str("skinparam state {\n");
    plantuml.push_str("  BackgroundColor<<Current>> YellowGreen\n");
    plantuml.push_str("}\n");
    let _ = writeln!(plantuml, "title {}\n", name);

    let mut lines: Vec<String> = transition_log
        .iter()
        .map(|((from, to), trigger)| {
            let mut line = format!("{} --> {}", endpoint(from), endpoint(to));
            if !trigger.is_empty() {
                let _ = write!(line, " : {}", trigger);
            }
            line
        })
        .collect();
    lines.sort();
    for line in lines {
        plantuml.push_str(&line);
        plantuml.push('\n');
    }

    // Mark current state
    if let Some(current) = current_state {
        let _ = writeln!(plantuml, "state {:?} <<Current>>", current);
    }

    plantuml.push_str("@enduml\n");
    plantuml
}

fn endpoint<S: Debug>(state: &Option<S>) -> String {
    match state {
        Some(s) => format!("{:?}", s),
        None => String::from("[*]"),
    }
}
