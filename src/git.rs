use crate::error::CheckError;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{AutotagOption, FetchOptions, Repository};
use std::path::Path;
use url::Url;

/// Clones `remote` into `dest` and leaves it checked out (detached) at
/// the first tag containing `version`.
pub fn checkout_version_tag(remote: &Url, version: &str, dest: &Path) -> Result<(), CheckError> {
    println!("Cloning {remote}...");

    let repository = RepoBuilder::new().clone(remote.as_str(), dest)?;

    fetch_all_tags(&repository)?;

    let tag_names = repository.tag_names(None)?;
    let tags: Vec<&str> = tag_names.iter().flatten().collect();

    let Some(tag) = select_tag(&tags, version) else {
        return Err(CheckError::TagNotFound {
            version: version.to_string(),
            tag_count: tags.len(),
        });
    };

    println!("Checking out tag '{tag}'...");
    checkout_detached(&repository, tag)
}

fn fetch_all_tags(repository: &Repository) -> Result<(), CheckError> {
    let mut remote = repository.find_remote("origin")?;
    let mut options = FetchOptions::new();

    options.download_tags(AutotagOption::All);
    remote.fetch(&[] as &[&str], Some(&mut options), None)?;

    Ok(())
}

/// Picks the first tag whose name contains the version as a substring,
/// in the order the tag listing returned them. A version like `1.2.3`
/// matches `v1.2.3` as well as `release-1.2.3`; with both `v1.2.3` and
/// `v1.2.30` listed, the first listed wins. Deliberately not an exact
/// match, and the tie-break must stay first-listed.
pub fn select_tag<'a>(tags: &[&'a str], version: &str) -> Option<&'a str> {
    tags.iter().find(|tag| tag.contains(version)).copied()
}

fn checkout_detached(repository: &Repository, tag: &str) -> Result<(), CheckError> {
    let reference = format!("refs/tags/{tag}");
    let commit = repository.revparse_single(&reference)?.peel_to_commit()?;

    repository.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
    repository.set_head_detached(commit.id())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn selects_first_substring_match() {
        let tags = ["v0.9.0", "release-1.2.3", "v1.2.3"];

        assert_eq!(select_tag(&tags, "1.2.3"), Some("release-1.2.3"));
    }

    #[test]
    fn selection_is_deterministic_for_ambiguous_versions() {
        let tags = ["v1.2.3", "v1.2.30"];

        for _ in 0..3 {
            assert_eq!(select_tag(&tags, "1.2.3"), Some("v1.2.3"));
        }

        let reversed = ["v1.2.30", "v1.2.3"];
        assert_eq!(select_tag(&reversed, "1.2.3"), Some("v1.2.30"));
    }

    #[test]
    fn no_substring_match_selects_nothing() {
        let tags = ["v1.0.0", "v2.0.0"];

        assert_eq!(select_tag(&tags, "1.2.3"), None);
    }

    fn seed_remote(dir: &Path) -> anyhow::Result<()> {
        let repository = git2::Repository::init(dir)?;

        let mut config = repository.config()?;
        config.set_str("user.name", "Test")?;
        config.set_str("user.email", "test@example.com")?;

        fs::write(dir.join("index.js"), "module.exports = 1;\n")?;

        let mut index = repository.index()?;
        index.add_path(Path::new("index.js"))?;
        index.write()?;

        let signature = git2::Signature::now("Test", "test@example.com")?;
        let tree_id = index.write_tree()?;
        let tree = repository.find_tree(tree_id)?;
        let commit_id =
            repository.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])?;

        let commit = repository.find_commit(commit_id)?;
        repository.tag(
            "v1.3.0",
            commit.as_object(),
            &signature,
            "release 1.3.0",
            false,
        )?;

        Ok(())
    }

    #[test]
    fn clones_and_checks_out_matching_tag() -> anyhow::Result<()> {
        let remote_dir = TempDir::new()?;
        let clone_dir = TempDir::new()?;
        let dest = clone_dir.path().join("git-origin");

        seed_remote(remote_dir.path())?;

        let remote = Url::from_directory_path(remote_dir.path()).unwrap();
        checkout_version_tag(&remote, "1.3.0", &dest)?;

        assert!(dest.join("index.js").is_file());

        let repository = git2::Repository::open(&dest)?;
        assert!(repository.head_detached()?);

        Ok(())
    }

    #[test]
    fn missing_tag_fails_the_acquisition() -> anyhow::Result<()> {
        let remote_dir = TempDir::new()?;
        let clone_dir = TempDir::new()?;
        let dest = clone_dir.path().join("git-origin");

        seed_remote(remote_dir.path())?;

        let remote = Url::from_directory_path(remote_dir.path()).unwrap();
        let result = checkout_version_tag(&remote, "9.9.9", &dest);

        assert!(matches!(
            result,
            Err(CheckError::TagNotFound { version, .. }) if version == "9.9.9"
        ));

        Ok(())
    }
}
