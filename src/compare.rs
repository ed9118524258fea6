use crate::error::CheckError;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};

/// One contiguous run of diff lines sharing a tag. `added` marks content
/// the artifact carries that the source does not account for; `removed`
/// marks source content absent from the artifact. Both false means the
/// run is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub text: String,
    pub added: bool,
    pub removed: bool,
}

/// The diff for one file of the registry artifact against its source
/// counterpart.
#[derive(Debug, Clone)]
pub struct FileDiff {
    pub relative_path: PathBuf,
    pub changes: Vec<Change>,
    /// The source-side file could not be read (usually: it does not
    /// exist, because the two builds produced different layouts). The
    /// diff is then taken against empty content, so the whole artifact
    /// file surfaces as added.
    pub source_unreadable: bool,
}

impl FileDiff {
    pub fn has_added_content(&self) -> bool {
        self.changes.iter().any(|change| change.added)
    }
}

/// Walks every regular file under `artifact_tree` (depth-first, sorted,
/// symlinks followed) and diffs it against the same relative path under
/// `source_tree`. Returns the full unfiltered list; deciding pass/fail
/// from it is the caller's job.
pub fn compare_trees(source_tree: &Path, artifact_tree: &Path) -> Result<Vec<FileDiff>, CheckError> {
    let mut relative_paths = Vec::new();

    collect_files(artifact_tree, artifact_tree, &mut relative_paths)?;

    let mut diffs = Vec::with_capacity(relative_paths.len());

    for relative_path in relative_paths {
        let artifact_path = artifact_tree.join(&relative_path);
        let artifact_content = read_text(&artifact_path)?;

        let source_path = source_tree.join(&relative_path);
        let (source_content, source_unreadable) = match fs::read(&source_path) {
            Ok(bytes) => (String::from_utf8_lossy(&bytes).into_owned(), false),
            Err(_) => (String::new(), true),
        };

        diffs.push(FileDiff {
            relative_path,
            changes: diff_trimmed_lines(&source_content, &artifact_content),
            source_unreadable,
        });
    }

    Ok(diffs)
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CheckError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<_, _>>()?;

    entries.sort();

    for entry_path in entries {
        // fs::metadata follows symlinks, so a link to a directory is
        // walked and a link to a file is compared like any other file.
        let metadata = fs::metadata(&entry_path).map_err(|source| CheckError::FileRead {
            path: entry_path.clone(),
            source,
        })?;

        if metadata.is_dir() {
            collect_files(root, &entry_path, files)?;
        } else {
            files.push(entry_path.strip_prefix(root).unwrap().to_path_buf());
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String, CheckError> {
    let bytes = fs::read(path).map_err(|source| CheckError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Line diff with each line trimmed before comparison: trailing
/// whitespace and CRLF/LF differences disappear, while inserting or
/// deleting a line (blank ones included) still registers. Consecutive
/// lines sharing a tag are folded into one change, preserving document
/// order.
pub fn diff_trimmed_lines(source: &str, artifact: &str) -> Vec<Change> {
    let source_lines: Vec<&str> = source.lines().map(str::trim).collect();
    let artifact_lines: Vec<&str> = artifact.lines().map(str::trim).collect();

    let diff = TextDiff::from_slices(&source_lines, &artifact_lines);
    let mut changes: Vec<Change> = Vec::new();

    for change in diff.iter_all_changes() {
        let (added, removed) = match change.tag() {
            ChangeTag::Insert => (true, false),
            ChangeTag::Delete => (false, true),
            ChangeTag::Equal => (false, false),
        };

        match changes.last_mut() {
            Some(last) if last.added == added && last.removed == removed => {
                last.text.push('\n');
                last.text.push_str(change.value());
            }
            _ => changes.push(Change {
                text: change.value().to_string(),
                added,
                removed,
            }),
        }
    }

    changes
}
