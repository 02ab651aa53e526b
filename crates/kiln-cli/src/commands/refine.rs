//! `kiln refine`

use anyhow::Result;
use kiln_gen::config::REFINER;
use kiln_gen::providers::create_completion_backend;
use kiln_gen::{KilnConfig, PromptRefiner};

pub fn run(prompt: &str) -> Result<()> {
    let config = KilnConfig::load()?;
    config.require_credentials(&[REFINER])?;

    let refiner = PromptRefiner::new(create_completion_backend(&config)?);
    let refined = refiner.refine(prompt);
    println!("{}", serde_json::to_string_pretty(&refined)?);
    Ok(())
}
