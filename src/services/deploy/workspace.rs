//! 单次请求的构建工作区
//!
//! 每次运行把合约项目模板复制到新的临时目录中构建，并发运行互不影响。
//! `Workspace` 被 drop 时目录随之删除。

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// 不从模板复制的目录
const SKIPPED_DIRS: &[&str] = &["target", ".git"];

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("contract project template not found: {0}")]
    TemplateMissing(PathBuf),
    #[error("failed to prepare workspace: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk contract project template: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("workspace preparation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// 把 `template_dir` 复制到新的临时目录
    pub async fn prepare(template_dir: &Path) -> Result<Self, WorkspaceError> {
        if !tokio::fs::try_exists(template_dir).await.unwrap_or(false) {
            return Err(WorkspaceError::TemplateMissing(template_dir.to_path_buf()));
        }

        let dir = tempfile::Builder::new()
            .prefix("stark-deploy-")
            .tempdir()?;

        let src = template_dir.to_path_buf();
        let dst = dir.path().to_path_buf();
        tokio::task::spawn_blocking(move || copy_project(&src, &dst)).await??;

        debug!(
            template = %template_dir.display(),
            workspace = %dir.path().display(),
            "Prepared workspace"
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// 覆盖工作区内的源码文件
    pub async fn write_source(&self, relative: &str, contents: &str) -> Result<(), WorkspaceError> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        Ok(())
    }
}

fn copy_project(src: &Path, dst: &Path) -> Result<(), WorkspaceError> {
    let walker = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_template() -> TempDir {
        let template = tempfile::tempdir().unwrap();
        std::fs::write(template.path().join("Scarb.toml"), "[package]\nname = \"t\"\n").unwrap();
        std::fs::create_dir_all(template.path().join("src")).unwrap();
        std::fs::write(template.path().join("src/lib.cairo"), "mod t {}\n").unwrap();
        std::fs::create_dir_all(template.path().join("target/dev")).unwrap();
        std::fs::write(template.path().join("target/dev/artifact.json"), "{}").unwrap();
        template
    }

    #[tokio::test]
    async fn test_prepare_copies_project_without_target() {
        let template = make_template();
        let workspace = Workspace::prepare(template.path()).await.unwrap();

        assert!(workspace.join("Scarb.toml").is_file());
        assert!(workspace.join("src/lib.cairo").is_file());
        assert!(!workspace.join("target").exists());
    }

    #[tokio::test]
    async fn test_workspace_is_isolated_and_removed_on_drop() {
        let template = make_template();
        let workspace = Workspace::prepare(template.path()).await.unwrap();
        workspace.write_source("src/lib.cairo", "mod changed {}\n").await.unwrap();

        let original = std::fs::read_to_string(template.path().join("src/lib.cairo")).unwrap();
        assert_eq!(original, "mod t {}\n");

        let path = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_template() {
        let result = Workspace::prepare(Path::new("/definitely/not/here")).await;
        assert!(matches!(result, Err(WorkspaceError::TemplateMissing(_))));
    }
}
