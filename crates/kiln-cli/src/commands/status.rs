//! `kiln status`

use anyhow::Result;
use kiln_core::TaskKind;
use kiln_gen::config::GENERATOR;
use kiln_gen::providers::create_task_api;
use kiln_gen::{ClientSettings, KilnConfig, ModelGenerationClient, Task, TaskResult};

pub fn run(task_id: &str, kind: &str, format: &str) -> Result<()> {
    let kind = TaskKind::parse(kind)
        .ok_or_else(|| anyhow::anyhow!("Unknown task kind '{}'. Use: shape, texture", kind))?;

    let config = KilnConfig::load()?;
    config.require_credentials(&[GENERATOR])?;

    let client = ModelGenerationClient::new(create_task_api(&config)?, ClientSettings::default());
    let task = client.poll(task_id, kind)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&task)?),
        _ => print_text(&task),
    }
    Ok(())
}

fn print_text(task: &Task) {
    println!("Task {} ({})", task.id, task.kind);
    println!("  status:    {}", task.status);
    println!("  progress:  {}%", task.progress);
    if let Some(error) = &task.error {
        println!("  error:     {}", error);
    }
    match &task.result {
        Some(TaskResult::Shape { model_url }) => {
            println!("  model:     {}", model_url.as_deref().unwrap_or("(none)"));
        }
        Some(TaskResult::Texture(output)) => {
            println!("  model:     {}", output.model_url.as_deref().unwrap_or("(none)"));
            if let Some(url) = &output.thumbnail_url {
                println!("  thumbnail: {}", url);
            }
            for texture in &output.textures {
                println!("  texture:   {} <- {}", texture.name, texture.url);
            }
        }
        None => {}
    }
}
