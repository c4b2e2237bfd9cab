mod support;

use std::fs;

use chrono::Duration;
use command_center::clock::Clock;
use command_center::task::TaskUpsert;
use command_center::Error;
use support::TestEnv;

#[test]
fn new_task_gets_defaults() {
    let env = TestEnv::new();
    let task = env.state.tasks.upsert(TaskUpsert::new("Write report")).unwrap();

    assert_eq!(task.id, "t_1");
    assert_eq!(task.title, "Write report");
    assert_eq!(task.status, "not_started");
    assert_eq!(task.detail, "");
    assert_eq!(task.created_at, task.updated_at);

    let tasks = env.state.tasks.get();
    assert_eq!(tasks, vec![task]);
}

#[test]
fn second_upsert_preserves_created_at() {
    let env = TestEnv::new();
    let first = env
        .state
        .tasks
        .upsert(TaskUpsert::new("Write report").with_id("t_x").with_detail("outline"))
        .unwrap();

    env.clock.advance(Duration::seconds(30));
    let second = env
        .state
        .tasks
        .upsert(TaskUpsert::new("Write final report").with_id("t_x").with_status("done"))
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.status, "done");
    assert_eq!(second.title, "Write final report");
    assert_eq!(second.detail, "outline");

    let tasks = env.state.tasks.get();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0], second);
}

#[test]
fn new_tasks_go_to_the_front_and_updates_stay_in_place() {
    let env = TestEnv::new();
    let tasks = &env.state.tasks;
    tasks.upsert(TaskUpsert::new("a").with_id("a")).unwrap();
    tasks.upsert(TaskUpsert::new("b").with_id("b")).unwrap();
    tasks.upsert(TaskUpsert::new("c").with_id("c")).unwrap();
    tasks
        .upsert(TaskUpsert::new("b2").with_id("b").with_status("blocked"))
        .unwrap();

    let ids: Vec<String> = tasks.get().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[test]
fn missing_title_leaves_store_untouched() {
    let env = TestEnv::new();
    env.state.tasks.upsert(TaskUpsert::new("keep me")).unwrap();
    let before = fs::read_to_string(env.tasks_file()).unwrap();

    let err = env.state.tasks.upsert(TaskUpsert::new("")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(fs::read_to_string(env.tasks_file()).unwrap(), before);
}

#[test]
fn every_upsert_records_an_event() {
    let env = TestEnv::new();
    let task = env.state.tasks.upsert(TaskUpsert::new("Write report")).unwrap();

    let events = env.state.events.read_tail(10).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "task.upsert");
    assert_eq!(events[0].detail, None);
    assert_eq!(events[0].extra["task"]["id"], task.id);
    assert_eq!(events[0].extra["task"]["status"], "not_started");
}

#[test]
fn missing_document_reads_as_empty() {
    let env = TestEnv::new();
    assert!(env.state.tasks.get().is_empty());
    assert!(env.state.tasks.load_strict().unwrap().tasks.is_empty());
}

#[test]
fn ensure_document_writes_empty_list_once() {
    let env = TestEnv::new();
    env.state.tasks.ensure_document().unwrap();
    let raw = fs::read_to_string(env.tasks_file()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value, serde_json::json!({ "tasks": [] }));

    env.state.tasks.upsert(TaskUpsert::new("x")).unwrap();
    env.state.tasks.ensure_document().unwrap();
    assert_eq!(env.state.tasks.get().len(), 1);
}

#[test]
fn corrupt_document_is_hidden_from_get_but_not_from_strict_load() {
    let env = TestEnv::new();
    fs::create_dir_all(env.data_dir()).unwrap();
    fs::write(env.tasks_file(), "{ \"tasks\": oops").unwrap();

    assert!(env.state.tasks.get().is_empty());
    assert!(matches!(
        env.state.tasks.load_strict(),
        Err(Error::Corrupt { .. })
    ));

    fs::write(env.tasks_file(), "{ \"tasks\": \"not a list\" }").unwrap();
    assert!(env.state.tasks.get().is_empty());
}

#[test]
fn upsert_recovers_from_corrupt_document() {
    let env = TestEnv::new();
    fs::create_dir_all(env.data_dir()).unwrap();
    fs::write(env.tasks_file(), "garbage").unwrap();

    let task = env.state.tasks.upsert(TaskUpsert::new("fresh start")).unwrap();
    assert_eq!(env.state.tasks.load_strict().unwrap().tasks, vec![task]);
}

#[test]
fn unreadable_record_does_not_cost_the_rest_of_the_store() {
    let env = TestEnv::new();
    fs::create_dir_all(env.data_dir()).unwrap();
    fs::write(
        env.tasks_file(),
        r#"{ "tasks": [
            { "id": "t_a", "title": "valid", "status": "done", "detail": "",
              "createdAt": "2024-01-01T00:00:00.000Z", "updatedAt": "2024-01-01T00:00:00.000Z" },
            { "id": "t_b", "title": "odd", "status": 5 }
        ] }"#,
    )
    .unwrap();

    let ids: Vec<String> = env.state.tasks.get().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["t_a"]);
    assert!(matches!(
        env.state.tasks.load_strict(),
        Err(Error::Corrupt { .. })
    ));

    env.state.tasks.upsert(TaskUpsert::new("new")).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(env.tasks_file()).unwrap()).unwrap();
    let stored_ids: Vec<&str> = raw["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["id"].as_str().unwrap())
        .collect();
    assert_eq!(stored_ids, vec!["t_1", "t_a", "t_b"]);
    assert_eq!(raw["tasks"][2]["status"], 5);
}

#[test]
fn updating_an_unreadable_record_repairs_it() {
    let env = TestEnv::new();
    fs::create_dir_all(env.data_dir()).unwrap();
    fs::write(
        env.tasks_file(),
        r#"{ "tasks": [ { "id": "t_b", "title": "odd", "status": 5, "createdAt": "yesterday" } ] }"#,
    )
    .unwrap();

    let task = env
        .state
        .tasks
        .upsert(TaskUpsert::new("fixed").with_id("t_b"))
        .unwrap();
    assert_eq!(task.status, "5");
    assert_eq!(task.created_at, env.clock.now());
    assert_eq!(env.state.tasks.load_strict().unwrap().tasks, vec![task]);
}

#[test]
fn blank_fields_never_overwrite() {
    let env = TestEnv::new();
    env.state
        .tasks
        .upsert(
            TaskUpsert::new("Write report")
                .with_id("t_x")
                .with_status("blocked")
                .with_detail("waiting on data"),
        )
        .unwrap();

    let task = env
        .state
        .tasks
        .upsert(
            TaskUpsert::new("Write report")
                .with_id("t_x")
                .with_status("")
                .with_detail(""),
        )
        .unwrap();
    assert_eq!(task.status, "blocked");
    assert_eq!(task.detail, "waiting on data");

    let fresh = env
        .state
        .tasks
        .upsert(TaskUpsert::new("Another").with_id(""))
        .unwrap();
    assert_eq!(fresh.id, "t_1");
}

#[test]
fn stored_timestamps_keep_milliseconds() {
    let env = TestEnv::new();
    env.state.tasks.upsert(TaskUpsert::new("x")).unwrap();
    let raw = fs::read_to_string(env.tasks_file()).unwrap();
    assert!(raw.contains("\"createdAt\": \"2024-06-01T08:00:00.000Z\""));
}
