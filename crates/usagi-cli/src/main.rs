mod config;
mod console;
mod run_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use console::ConsoleUi;
use run_cmd::RunArgs;

#[derive(Parser)]
#[command(name = "usagi", about = "うさぎさん株式会社: markdown指示書からパッチ適用までの小さなエージェントパイプライン")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on an instruction document
    Run {
        /// Path to the markdown instruction document
        spec: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Working directory the patch is applied in
        #[arg(long, default_value = "workdir")]
        workdir: PathBuf,
        /// Model identifier (overrides USAGI_MODEL env var and config file)
        #[arg(long)]
        model: Option<String>,
        /// Plan only; no filesystem or process side effects
        #[arg(long)]
        dry_run: bool,
        /// Use deterministic generators instead of the API
        #[arg(long)]
        offline: bool,
    },
    /// Write a usagi config file
    Init {
        /// API base URL to record in the config file
        #[arg(long)]
        api_base: Option<String>,
        /// Default model to record in the config file
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the `usagi init` command: write config file.
fn cmd_init(api_base: Option<String>, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        api: config::ApiSection { base_url: api_base },
        run: config::RunSection { model },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if let Some(url) = &cfg.api.base_url {
        println!("  api.base_url = {url}");
    }
    if let Some(model) = &cfg.run.model {
        println!("  run.model = {model}");
    }
    println!();
    println!("Next: set OPENAI_API_KEY and run `usagi run <spec.md>`.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            spec,
            out,
            workdir,
            model,
            dry_run,
            offline,
        } => {
            run_cmd::run(
                RunArgs {
                    spec,
                    out,
                    workdir,
                    model,
                    dry_run,
                    offline,
                },
                &ConsoleUi,
            )
            .await?;
        }
        Commands::Init {
            api_base,
            model,
            force,
        } => {
            cmd_init(api_base, model, force)?;
        }
    }

    Ok(())
}
