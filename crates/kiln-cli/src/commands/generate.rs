//! `kiln generate`

use anyhow::{Context, Result};
use kiln_gen::{GenerationRequest, KilnConfig, Pipeline, SavedAssets};

pub struct GenerateArgs {
    pub prompt: String,
    pub output: Option<String>,
    pub timeout: Option<u64>,
    pub poll_interval: Option<u64>,
    pub no_refine: bool,
    pub format: String,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    if args.prompt.trim().is_empty() {
        anyhow::bail!("Prompt must not be empty");
    }

    let mut config = KilnConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);

    // Missing credentials fail here, before any request is made
    let pipeline = Pipeline::from_config(&config, !args.no_refine)?;

    let saved = pipeline.run(&GenerationRequest::new(args.prompt.trim()))?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&saved)?),
        _ => print_text(&saved),
    }
    Ok(())
}

fn apply_overrides(config: &mut KilnConfig, args: &GenerateArgs) {
    if let Some(output) = &args.output {
        config.generation.output_dir = output.clone();
    }
    if let Some(timeout) = args.timeout {
        config.generation.timeout_secs = timeout;
    }
    if let Some(interval) = args.poll_interval {
        config.generation.poll_interval_secs = interval;
    }
}

fn print_text(saved: &SavedAssets) {
    println!("Saved to {}", saved.output_dir.display());
    match &saved.model_path {
        Some(path) => println!("  model:     {}", path.display()),
        None => println!("  model:     (none returned)"),
    }
    if let Some(path) = &saved.thumbnail_path {
        println!("  thumbnail: {}", path.display());
    }
    for path in &saved.texture_paths {
        println!("  texture:   {}", path.display());
    }
    println!("  record:    {}", saved.record_path.display());
}
