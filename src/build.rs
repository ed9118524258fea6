use crate::config::Config;
use crate::error::CheckError;
use crate::shell;
use crate::tree::{TreeOrigin, WorkingTree};
use std::fs::{self, read_to_string};
use std::io;
use std::path::Path;

/// Applies the same build procedure to a tree regardless of where it
/// came from: a clean dependency install with a best-effort fallback,
/// then the package's own build script when it declares one.
pub fn install_and_build(config: &Config, tree: &WorkingTree) -> Result<(), CheckError> {
    let cwd = tree.path();
    let timeout = config.command_timeout;

    println!("Installing dependencies in {}...", tree.origin());

    if let Err(clean_error) = shell::run("npm", &["ci"], cwd, timeout) {
        if matches!(clean_error, CheckError::Timeout { .. }) {
            return Err(clean_error);
        }

        println!("Clean install failed. Falling back to a regular install...");
        shell::run("npm", &["install"], cwd, timeout)?;
    }

    if has_build_script(cwd)? {
        println!("Running build script in {}...", tree.origin());
        shell::run("npm", &["run", "build"], cwd, timeout)?;
    } else {
        println!("No build script declared in {}. Skipping...", tree.origin());
    }

    Ok(())
}

/// A missing or unparsable package.json means there is nothing to run;
/// the install step has already surfaced anything genuinely broken.
pub fn has_build_script(dir: &Path) -> Result<bool, CheckError> {
    let manifest_path = dir.join("package.json");

    if !manifest_path.is_file() {
        return Ok(false);
    }

    let manifest = json::parse(&read_to_string(manifest_path)?)?;

    Ok(manifest["scripts"]["build"].is_string())
}

/// Removes content that must not participate in the comparison: VCS
/// metadata and installed dependencies on the source side, installed
/// dependencies and leftover archives on the registry side.
pub fn strip_housekeeping(tree: &WorkingTree) -> Result<(), CheckError> {
    match tree.origin() {
        TreeOrigin::Source => {
            remove_dir_if_present(&tree.path().join(".git"))?;
            remove_dir_if_present(&tree.path().join("node_modules"))?;
        }
        TreeOrigin::Registry => {
            remove_dir_if_present(&tree.path().join("node_modules"))?;
            remove_archive_files(tree.path())?;
        }
    }

    Ok(())
}

fn remove_dir_if_present(path: &Path) -> Result<(), CheckError> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    }

    Ok(())
}

fn remove_archive_files(dir: &Path) -> Result<(), CheckError> {
    // A non-UTF-8 path cannot be turned into a glob pattern; silently
    // shortening it would aim the *.tgz match at the wrong directory.
    let Some(dir_str) = dir.to_str() else {
        return Err(CheckError::FileRead {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        });
    };

    // Pattern::escape is applied to the directory half only, so a
    // package name with glob metacharacters cannot widen the match.
    let escaped_dir = glob::Pattern::escape(dir_str);
    let pattern = format!("{escaped_dir}/*.tgz");

    for entry in glob::glob(&pattern)? {
        fs::remove_file(entry?)?;
    }

    Ok(())
}
