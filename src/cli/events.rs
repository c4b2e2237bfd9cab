use serde_json::Value;

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::events::{Event, EventDraft};

use super::{print_json, EventCommands};

pub fn run(state: &AppState, command: EventCommands, json: bool) -> Result<()> {
    match command {
        EventCommands::Tail { limit } => {
            let events = state.events.read_tail(limit)?;
            if json {
                return print_json(&events);
            }
            for event in &events {
                println!("{}", format_event(event));
            }
            Ok(())
        }
        EventCommands::Append { kind, detail } => {
            let detail = match detail {
                Some(raw) => serde_json::from_str::<Value>(&raw)
                    .map_err(|err| Error::Validation(format!("detail is not valid JSON: {err}")))?,
                None => Value::Null,
            };
            let event = state.events.append(EventDraft::new(kind).with_detail(detail))?;
            if json {
                return print_json(&event);
            }
            println!("{}", format_event(&event));
            Ok(())
        }
    }
}

fn format_event(event: &Event) -> String {
    let ts = event.ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    match &event.detail {
        Some(detail) if !detail.is_null() => format!("{ts} {} {detail}", event.kind),
        _ => format!("{ts} {}", event.kind),
    }
}
