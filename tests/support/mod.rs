#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{TimeZone, Utc};
use command_center::api::AppState;
use command_center::clock::FixedClock;
use command_center::config::{ActivityConfig, Config};
use command_center::ids::SequentialIds;
use command_center::storage::Storage;
use tempfile::TempDir;

pub struct TestEnv {
    dir: TempDir,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
}

impl TestEnv {
    /// Data in `<tmp>/data`, external logs expected in `<tmp>/logs`
    /// (which does not exist until a log is written).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        let config = Config {
            activity: ActivityConfig {
                dir: dir.path().join("logs"),
                ..ActivityConfig::default()
            },
            ..Config::default()
        };
        let state = AppState::new(
            Storage::new(dir.path().join("data")),
            &config,
            clock.clone(),
            Arc::new(SequentialIds::new()),
        )
        .expect("state");
        Self { dir, clock, state }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join("tasks.json")
    }

    pub fn events_file(&self) -> PathBuf {
        self.data_dir().join("events.jsonl")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    /// Write an external log file and backdate it by `age_secs`.
    pub fn write_log(&self, name: &str, contents: &str, age_secs: u64) -> PathBuf {
        let dir = self.logs_dir();
        fs::create_dir_all(&dir).expect("create logs dir");
        let path = dir.join(name);
        fs::write(&path, contents).expect("write log");
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(mtime))
            .expect("set mtime");
        path
    }
}
