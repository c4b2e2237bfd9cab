use std::path::PathBuf;

use crate::api::AppState;
use crate::error::Result;
use crate::server::{self, ServerOptions};

pub fn run(state: AppState, host: String, port: u16, web_dir: PathBuf) -> Result<()> {
    let options = ServerOptions {
        host,
        port,
        web_dir: Some(web_dir),
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::run(state, options))
}
