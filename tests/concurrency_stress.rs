mod support;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use command_center::events::EventDraft;
use command_center::task::TaskUpsert;
use support::TestEnv;

#[test]
fn parallel_upserts_lose_no_tasks() {
    let env = TestEnv::new();
    let threads = 8;
    let per_thread = 5;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            let tasks = env.state.tasks.clone();
            thread::spawn(move || {
                barrier.wait();
                for n in 0..per_thread {
                    tasks
                        .upsert(TaskUpsert::new(format!("task {t}-{n}")).with_id(format!("w{t}-{n}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ids: HashSet<String> = env.state.tasks.get().into_iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), threads * per_thread);

    let events = env.state.events.read_tail(2000).unwrap();
    assert_eq!(events.len(), threads * per_thread);
}

#[test]
fn parallel_appends_never_interleave() {
    let env = TestEnv::new();
    let threads = 6;
    let per_thread = 20;
    let barrier = Arc::new(Barrier::new(threads));
    let payload = "x".repeat(4096);

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let barrier = Arc::clone(&barrier);
            let events = env.state.events.clone();
            let payload = payload.clone();
            thread::spawn(move || {
                barrier.wait();
                for n in 0..per_thread {
                    events
                        .append(
                            EventDraft::new("bulk")
                                .with_detail(serde_json::json!({ "t": t, "n": n, "pad": payload })),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let events = env.state.events.read_tail(2000).unwrap();
    assert_eq!(events.len(), threads * per_thread);
}
