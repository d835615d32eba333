//! Implementation of `usagi run`: read the instruction document, parse
//! it, drive the pipeline, and land the report.

use std::path::{Path, PathBuf};

use anyhow::Context;

use usagi_core::llm::{OpenAiClient, TextGenerator};
use usagi_core::pipeline::{RunMode, run_pipeline};
use usagi_core::spec::parse_spec_markdown;
use usagi_core::ui::Ui;
use usagi_core::vcs::GitCli;

use crate::config::UsagiConfig;

pub struct RunArgs {
    pub spec: PathBuf,
    pub out: Option<PathBuf>,
    pub workdir: PathBuf,
    pub model: Option<String>,
    pub dry_run: bool,
    pub offline: bool,
}

/// Execute one pipeline run end to end.
///
/// The API credential is checked before any pipeline work starts, and
/// only when the resolved mode actually needs the network.
pub async fn run(args: RunArgs, ui: &dyn Ui) -> anyhow::Result<()> {
    let mode = RunMode::resolve(args.dry_run, args.offline);
    let config = UsagiConfig::resolve(args.model.as_deref());
    tracing::debug!(model = %config.model, %mode, "resolved run configuration");

    let step = ui.step("指示書を読み込み中...");
    let markdown = match std::fs::read_to_string(&args.spec) {
        Ok(text) => text,
        Err(e) => {
            step.fail(None);
            return Err(e)
                .with_context(|| format!("failed to read spec file {}", args.spec.display()));
        }
    };
    let spec = match parse_spec_markdown(&markdown) {
        Ok(spec) => spec,
        Err(e) => {
            step.fail(None);
            return Err(e)
                .with_context(|| format!("failed to parse spec file {}", args.spec.display()));
        }
    };
    step.succeed(Some("読み込みOK"));

    let workdir = std::path::absolute(&args.workdir)
        .with_context(|| format!("failed to resolve workdir {}", args.workdir.display()))?;

    // Live mode needs a credential up front; offline and dry-run never
    // touch the network.
    let client = match mode {
        RunMode::Live => Some(
            OpenAiClient::from_env(&config.base_url)
                .context("live mode requires an API credential")?,
        ),
        RunMode::DryRun | RunMode::Offline => None,
    };
    let generator = client.as_ref().map(|c| c as &dyn TextGenerator);

    let outcome = run_pipeline(&spec, &workdir, &config.model, mode, generator, &GitCli, ui)
        .await
        .context("pipeline failed")?;

    deliver_report(&outcome.report, args.out.as_deref(), ui)?;
    Ok(())
}

/// Write the report to `out` (creating parent directories), or print it
/// when no output path was given.
fn deliver_report(report: &str, out: Option<&Path>, ui: &dyn Ui) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create report directory {}", parent.display())
                    })?;
                }
            }
            std::fs::write(path, report)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            ui.log(&format!("レポートを書き出しました: {}", path.display()));
        }
        None => {
            println!("{report}");
        }
    }
    Ok(())
}
