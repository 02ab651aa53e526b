//! Kiln CLI - turn a text prompt into a textured 3D model

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, refine, status};

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Generate textured 3D models from text prompts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: refine, shape, texture, download
    Generate {
        /// What to generate (e.g., "a red wooden chair")
        prompt: String,

        /// Root directory for downloaded assets (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// Per-task timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Seconds between status checks (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: Option<u64>,

        /// Skip prompt refinement and use the prompt for shape and style
        #[arg(long)]
        no_refine: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Split a prompt into object and style prompts and print them
    Refine {
        /// Prompt to refine
        prompt: String,
    },

    /// Check a generation task once
    Status {
        /// Task ID returned by the generation service
        task_id: String,

        /// Task kind (shape or texture)
        #[arg(long, default_value = "texture")]
        kind: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    // Keys usually live in .env.local next to the project
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            prompt,
            output,
            timeout,
            poll_interval,
            no_refine,
            format,
        } => generate::run(generate::GenerateArgs {
            prompt,
            output,
            timeout,
            poll_interval,
            no_refine,
            format,
        }),
        Commands::Refine { prompt } => refine::run(&prompt),
        Commands::Status {
            task_id,
            kind,
            format,
        } => status::run(&task_id, &kind, &format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        assert!(Cli::try_parse_from(["kiln", "generate", "a chair", "--poll-interval", "0"]).is_err());

        let cli = Cli::try_parse_from(["kiln", "generate", "a chair", "--poll-interval", "2"]).unwrap();
        match cli.command {
            Commands::Generate { poll_interval, .. } => assert_eq!(poll_interval, Some(2)),
            _ => panic!("expected generate"),
        }
    }
}
