//! command-center - local dashboard backend library
//!
//! Everything is a thin layer over flat files in one data directory.
//!
//! # Module Organization
//!
//! - `task`: task document with upsert-by-id
//! - `events`: append-only JSONL event log with bounded tail reads
//! - `activity`: newest external log discovery, tailing and marker filtering
//! - `api`: axum router and handlers
//! - `server`: bind, startup event, graceful shutdown
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `command-center.toml`
//! - `storage`: data directory layout and file I/O helpers
//! - `lock`: file locking and atomic writes
//! - `clock`, `ids`: injectable time and id sources
//! - `error`: error types and result aliases

pub mod activity;
pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod lock;
pub mod server;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
