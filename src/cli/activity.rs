use crate::api::AppState;
use crate::error::{Error, Result};

use super::print_json;

pub fn run_activity(state: &AppState, limit: Option<usize>, json: bool) -> Result<()> {
    match state.activity.read_activity(limit) {
        Ok(feed) => {
            if json {
                return print_json(&feed);
            }
            for item in &feed.items {
                println!("{item}");
            }
            Ok(())
        }
        Err(Error::NotAvailable(message)) => {
            eprintln!("{message}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

pub fn run_logs(state: &AppState, lines: usize, json: bool) -> Result<()> {
    match state.activity.read_logs(lines) {
        Ok(tail) => {
            if json {
                return print_json(&tail);
            }
            println!("{}", tail.lines);
            Ok(())
        }
        Err(Error::NotAvailable(message)) => {
            eprintln!("{message}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
