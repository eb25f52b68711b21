//! Command implementations for tm-cli

use std::path::Path;

use serde::Serialize;
use tm_core::{Config, Engine};

use crate::error::Result;

pub mod credential;
pub mod repo;
pub mod sync;

pub use credential::run_credential;
pub use repo::run_repo;
pub use sync::run_sync;

/// Load configuration and open the engine.
pub fn open_engine(config_path: Option<&Path>) -> Result<Engine> {
    let config = Config::load(config_path)?;
    Ok(Engine::open(&config)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
