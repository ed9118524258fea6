use crate::config::Config;
use crate::error::CheckError;
use crate::pkg::PackageSpec;
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::Display;
use tempfile::TempDir;

/// Which acquisition path produced a tree. The serialized form names the
/// subdirectory each tree lives in under the run's scratch root.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeOrigin {
    #[strum(serialize = "npm-origin")]
    Registry,
    #[strum(serialize = "git-origin")]
    Source,
}

/// One side of the comparison: a directory that has been populated,
/// built, and stripped of housekeeping content.
#[derive(Debug)]
pub struct WorkingTree {
    origin: TreeOrigin,
    path: PathBuf,
}

impl WorkingTree {
    pub fn create(workspace_root: &Path, origin: TreeOrigin) -> Result<Self, CheckError> {
        let path = workspace_root.join(origin.to_string());

        fs::create_dir(&path)?;

        Ok(WorkingTree { origin, path })
    }

    pub fn origin(&self) -> TreeOrigin {
        self.origin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The per-run scratch root both working trees live under. Named after
/// the package plus a random suffix so concurrent runs never collide.
pub struct RunWorkspace {
    root: WorkspaceRoot,
}

/// A retained workspace gives up its `TempDir` the moment it is
/// created: failing runs are precisely the ones whose trees must stay
/// on disk for triage, and they never reach `finish()`.
enum WorkspaceRoot {
    Retained(PathBuf),
    Ephemeral(TempDir),
}

impl RunWorkspace {
    pub fn create(config: &Config, spec: &PackageSpec) -> Result<Self, CheckError> {
        fs::create_dir_all(&config.scratch_dir)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-{}-", spec.dir_safe_name(), spec.version))
            .tempdir_in(&config.scratch_dir)?;

        let root = if config.retain_working_trees {
            WorkspaceRoot::Retained(dir.keep())
        } else {
            WorkspaceRoot::Ephemeral(dir)
        };

        Ok(RunWorkspace { root })
    }

    pub fn path(&self) -> &Path {
        match &self.root {
            WorkspaceRoot::Retained(path) => path,
            WorkspaceRoot::Ephemeral(dir) => dir.path(),
        }
    }

    /// Ends the workspace's life: reports where a retained workspace
    /// lives, or deletes an ephemeral one.
    pub fn finish(self) -> Result<Option<PathBuf>, CheckError> {
        match self.root {
            WorkspaceRoot::Retained(path) => Ok(Some(path)),
            WorkspaceRoot::Ephemeral(dir) => {
                dir.close()?;
                Ok(None)
            }
        }
    }
}
