use crate::build;
use crate::config::Config;
use crate::error::CheckError;
use crate::git;
use crate::npm;
use crate::pkg::PackageSpec;
use crate::tarball;
use crate::tree::{RunWorkspace, TreeOrigin, WorkingTree};

/// Both comparably-built trees for one package check, still rooted in
/// their run workspace.
pub struct Acquisition {
    workspace: RunWorkspace,
    pub source_tree: WorkingTree,
    pub artifact_tree: WorkingTree,
}

impl Acquisition {
    /// Hands the workspace back for retention or deletion. Returns the
    /// retained path, if any.
    pub fn finish(self) -> Result<Option<std::path::PathBuf>, CheckError> {
        self.workspace.finish()
    }
}

pub struct Acquirer<'a> {
    config: &'a Config,
}

impl<'a> Acquirer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Acquirer { config }
    }

    /// Produces the two working trees for `spec`. Strictly sequential:
    /// every step's output is the next step's input, and the first
    /// failure aborts the whole acquisition with its cause untouched.
    pub fn acquire(&self, spec: &PackageSpec) -> Result<Acquisition, CheckError> {
        let metadata = npm::fetch_version_metadata(self.config, spec)?;
        let workspace = RunWorkspace::create(self.config, spec)?;

        let source_tree = WorkingTree::create(workspace.path(), TreeOrigin::Source)?;
        git::checkout_version_tag(&metadata.repository_url, &spec.version, source_tree.path())?;

        let artifact_tree = WorkingTree::create(workspace.path(), TreeOrigin::Registry)?;
        tarball::fetch_and_extract(self.config, &metadata.dist, artifact_tree.path())?;

        build::install_and_build(self.config, &source_tree)?;
        build::install_and_build(self.config, &artifact_tree)?;

        build::strip_housekeeping(&source_tree)?;
        build::strip_housekeeping(&artifact_tree)?;

        Ok(Acquisition {
            workspace,
            source_tree,
            artifact_tree,
        })
    }
}
