//! Working-tree operations behind a narrow capability interface.
//!
//! The orchestrator only needs three operations: initialize a repository,
//! apply a patch file, and list the directory. Keeping them behind
//! [`WorkspaceVcs`] lets the stage sequencing be tested without a real
//! git binary or filesystem layout.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from external working-tree commands.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The command could not be spawned at all.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status.
    #[error("{command} failed (exit {code}): {stderr}")]
    Exit {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Capability interface over the working directory.
#[async_trait]
pub trait WorkspaceVcs: Send + Sync {
    /// Initialize a version-control repository in `workdir`. Idempotent.
    async fn init_repo(&self, workdir: &Path) -> Result<(), VcsError>;

    /// Apply a patch file to the working tree, ignoring whitespace-only
    /// conflicts.
    async fn apply_patch(&self, workdir: &Path, patch_file: &Path) -> Result<(), VcsError>;

    /// Produce a directory listing of `workdir`, captured verbatim.
    /// Read-only; calling it twice on an unchanged tree yields identical
    /// output.
    async fn list_directory(&self, workdir: &Path) -> Result<String, VcsError>;
}

// Compile-time assertion: WorkspaceVcs must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn WorkspaceVcs) {}
};

/// Production implementation shelling out to `git` and `ls`.
#[derive(Debug, Default, Clone)]
pub struct GitCli;

/// Run a command in `dir`, capturing output. Returns stdout on success.
async fn run(program: &str, args: &[&str], dir: &Path) -> Result<String, VcsError> {
    let rendered = format!("{program} {}", args.join(" "));

    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| VcsError::Spawn {
            command: rendered.clone(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(VcsError::Exit {
            command: rendered,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[async_trait]
impl WorkspaceVcs for GitCli {
    async fn init_repo(&self, workdir: &Path) -> Result<(), VcsError> {
        run("git", &["init"], workdir).await?;
        Ok(())
    }

    async fn apply_patch(&self, workdir: &Path, patch_file: &Path) -> Result<(), VcsError> {
        let patch = patch_file.to_string_lossy();
        run(
            "git",
            &["apply", "--whitespace=nowarn", patch.as_ref()],
            workdir,
        )
        .await?;
        Ok(())
    }

    async fn list_directory(&self, workdir: &Path) -> Result<String, VcsError> {
        run("ls", &["-la"], workdir).await
    }
}
