//! Pipeline orchestration: PLAN -> PREPARE_DIR -> GENERATE_PATCH ->
//! APPLY -> CHECK -> REPORT, with a dry-run early exit after PLAN.
//!
//! The orchestrator is strictly sequential; each stage starts only after
//! the previous one resolved. Progress is reported through the [`Ui`]
//! sink at stage boundaries, and the UI is never consulted for decisions.

pub mod offline;
pub mod prompt;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::llm::{LlmError, TextGenerator};
use crate::report;
use crate::spec::Specification;
use crate::ui::Ui;
use crate::vcs::{VcsError, WorkspaceVcs};

/// Fixed filename the patch is persisted under, inside the working
/// directory. Written on every non-dry run, whether or not the apply
/// succeeds.
pub const PATCH_FILE_NAME: &str = ".usagi.patch";

/// Run mode, resolved once from the two CLI flags.
///
/// Dry-run takes priority over offline: `--dry-run --offline` behaves
/// exactly like `--dry-run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Plan only; no filesystem or process side effects, empty action log.
    DryRun,
    /// Full stage sequence with deterministic generators.
    Offline,
    /// Full stage sequence with the external generation API.
    Live,
}

impl RunMode {
    /// Collapse the `{dry_run, offline}` flag pair into one mode.
    pub fn resolve(dry_run: bool, offline: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else if offline {
            Self::Offline
        } else {
            Self::Live
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DryRun => "dry-run",
            Self::Offline => "offline",
            Self::Live => "live",
        };
        f.write_str(name)
    }
}

/// Errors that abort the pipeline.
///
/// Patch application is deliberately absent: init/apply failures are
/// absorbed into the action log and the run continues to CHECK.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Working-directory creation failed. Fatal: nothing downstream can
    /// succeed without it.
    #[error("failed to create working directory {path:?}: {source}")]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The patch file could not be persisted.
    #[error("failed to write patch file {path:?}: {source}")]
    PatchWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Live mode was requested without a generation client.
    #[error("live mode requires a text generator")]
    MissingGenerator,

    /// A generation call failed.
    #[error(transparent)]
    Generate(#[from] LlmError),

    /// The post-apply verification failed; the environment itself is
    /// broken, so this propagates (unlike apply failures).
    #[error("post-apply check failed: {0}")]
    Check(#[from] VcsError),
}

/// Result of a completed (or dry-run) pipeline.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The final markdown report.
    pub report: String,
}

/// Run the pipeline for one specification.
///
/// `generator` is only consulted in [`RunMode::Live`]; passing `None` in
/// live mode is an error. The report is produced only on full or dry-run
/// completion; fatal errors yield no report.
pub async fn run_pipeline(
    spec: &Specification,
    workdir: &Path,
    model: &str,
    mode: RunMode,
    generator: Option<&dyn TextGenerator>,
    vcs: &dyn WorkspaceVcs,
    ui: &dyn Ui,
) -> Result<PipelineOutcome, PipelineError> {
    ui.section(&format!(
        "うさぎさん株式会社: 実行開始 / project={}",
        spec.project
    ));
    ui.log(&format!("workdir: {}", workdir.display()));
    ui.log(&format!("model: {model}"));
    ui.log(&format!("mode: {mode}"));

    // PLAN. Dry-run uses the offline planner even when a generator is
    // available, so planning stays side-effect free.
    let step = ui.step("社長うさぎが計画を作成中...");
    let plan = match mode {
        RunMode::Live => {
            let Some(generator) = generator else {
                step.fail(None);
                return Err(PipelineError::MissingGenerator);
            };
            match generator.generate(model, &prompt::plan_prompt(spec)).await {
                Ok(text) => text,
                Err(e) => {
                    step.fail(None);
                    return Err(e.into());
                }
            }
        }
        RunMode::DryRun | RunMode::Offline => offline::plan(spec),
    };
    step.succeed(Some("計画ができました"));

    if mode == RunMode::DryRun {
        let notes = vec!["dry-runのため実行はしていません（offline計画）".to_string()];
        let report = report::compose_report(spec, workdir, &plan, &[], &notes);
        return Ok(PipelineOutcome { report });
    }

    let mut actions: Vec<String> = Vec::new();

    // PREPARE_DIR. Recursive and idempotent; failure is fatal.
    let step = ui.step("作業ディレクトリを準備中...");
    if let Err(e) = tokio::fs::create_dir_all(workdir).await {
        step.fail(None);
        return Err(PipelineError::Workdir {
            path: workdir.to_path_buf(),
            source: e,
        });
    }
    step.succeed(Some("準備OK"));

    // GENERATE_PATCH.
    let step = ui.step("実装うさぎが生成/編集案を作成中...");
    let patch = match mode {
        RunMode::Live => {
            let Some(generator) = generator else {
                step.fail(None);
                return Err(PipelineError::MissingGenerator);
            };
            match generator
                .generate(model, &prompt::patch_prompt(spec, &plan))
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    step.fail(None);
                    return Err(e.into());
                }
            }
        }
        RunMode::DryRun | RunMode::Offline => offline::patch(spec),
    };
    step.succeed(Some("変更案ができました"));

    // APPLY. The patch file is always written; init/apply failures are
    // recorded as a single action entry and the run continues.
    let step = ui.step("変更を適用中...");
    let patch_path = workdir.join(PATCH_FILE_NAME);
    if let Err(e) = tokio::fs::write(&patch_path, &patch).await {
        step.fail(None);
        return Err(PipelineError::PatchWrite {
            path: patch_path,
            source: e,
        });
    }
    actions.push(format!("write {}", patch_path.display()));

    match apply_to_tree(vcs, workdir, &patch_path).await {
        Ok(()) => actions.push(format!("git apply {PATCH_FILE_NAME}")),
        Err(e) => {
            tracing::warn!(error = %e, "patch apply failed, continuing to check");
            actions.push(format!("patch apply failed: {e}"));
        }
    }
    step.succeed(Some("適用しました"));

    // CHECK. Read-only, observed strictly after APPLY's mutations.
    let step = ui.step("監査うさぎが簡易チェック中...");
    let listing = match vcs.list_directory(workdir).await {
        Ok(out) => out,
        Err(e) => {
            step.fail(None);
            return Err(PipelineError::Check(e));
        }
    };
    actions.push("ls -la".to_string());
    step.succeed(Some("チェック完了"));

    let summary = format!("作業ディレクトリの一覧:\n\n```\n{listing}\n```\n");
    let report = report::compose_report(
        spec,
        workdir,
        &plan,
        &actions,
        std::slice::from_ref(&summary),
    );
    Ok(PipelineOutcome { report })
}

/// Best-effort repository init + patch application.
async fn apply_to_tree(
    vcs: &dyn WorkspaceVcs,
    workdir: &Path,
    patch_path: &Path,
) -> Result<(), VcsError> {
    vcs.init_repo(workdir).await?;
    vcs.apply_patch(workdir, patch_path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_resolution_collapses_four_combinations_to_three() {
        assert_eq!(RunMode::resolve(false, false), RunMode::Live);
        assert_eq!(RunMode::resolve(false, true), RunMode::Offline);
        assert_eq!(RunMode::resolve(true, false), RunMode::DryRun);
        // dry-run takes priority over offline
        assert_eq!(RunMode::resolve(true, true), RunMode::DryRun);
    }

    #[test]
    fn mode_display_names() {
        assert_eq!(RunMode::DryRun.to_string(), "dry-run");
        assert_eq!(RunMode::Offline.to_string(), "offline");
        assert_eq!(RunMode::Live.to_string(), "live");
    }
}
