//! `linkpeek-replay`: run a recorded interaction against the link
//! detection engine and print what it did.
//!
//! ```text
//! linkpeek-replay demos/long_press.toml
//! ```
//!
//! Set `RUST_LOG=debug` to trace gesture state transitions.

use anyhow::{Context, Result};
use linkpeek_app::{Scenario, replay};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: linkpeek-replay <scenario.toml>")?;
    let source = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let scenario = Scenario::from_toml(&source).with_context(|| format!("parsing {path}"))?;
    log::info!(
        "replaying {path}: {} elements, {} events",
        scenario.elements.len(),
        scenario.events.len()
    );

    let lines = replay::run(&scenario)?;
    for line in &lines {
        println!("{line}");
    }
    Ok(())
}
