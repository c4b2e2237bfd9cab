use crate::api::AppState;
use crate::error::Result;
use crate::task::{Task, TaskDocument, TaskUpsert};

use super::{print_json, TaskCommands};

pub fn run(state: &AppState, command: TaskCommands, json: bool) -> Result<()> {
    match command {
        TaskCommands::List => {
            let tasks = state.tasks.get();
            if json {
                return print_json(&TaskDocument { tasks });
            }
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in &tasks {
                println!("{}", format_task(task));
            }
            Ok(())
        }
        TaskCommands::Upsert {
            title,
            id,
            status,
            detail,
        } => {
            let request = TaskUpsert {
                id,
                title,
                status,
                detail,
            }
            .normalized();
            let task = state.tasks.upsert(request)?;
            if json {
                return print_json(&task);
            }
            println!("{}", format_task(&task));
            Ok(())
        }
    }
}

fn format_task(task: &Task) -> String {
    let mut line = format!(
        "{id}  [{status}]  {title}",
        id = task.id,
        status = task.status,
        title = task.title
    );
    if !task.detail.is_empty() {
        line.push_str(&format!("  - {}", task.detail));
    }
    line
}
