use crate::compare::FileDiff;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

const TERM_STYLE_BOLD: &str = "\x1b[1m";
const TERM_STYLE_GREEN: &str = "\x1b[32m";
const TERM_STYLE_RED: &str = "\x1b[31m";
const TERM_STYLE_RESET: &str = "\x1b[0m";

/// The final classification of a check. Failure keeps every diff that
/// carries added content as evidence.
pub enum Verdict {
    Pass,
    Fail { diverged: Vec<FileDiff> },
}

impl Verdict {
    /// Pass iff no file of the artifact carries content its source
    /// counterpart cannot account for.
    pub fn from_diffs(diffs: Vec<FileDiff>) -> Self {
        let diverged: Vec<FileDiff> = diffs
            .into_iter()
            .filter(FileDiff::has_added_content)
            .collect();

        if diverged.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail { diverged }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

pub fn print_verdict(
    verdict: &Verdict,
    retained_at: &Option<PathBuf>,
    start_timestamp: Instant,
) -> ExitCode {
    let elapsed_time = start_timestamp.elapsed().as_secs_f32();

    let exit_code = match verdict {
        Verdict::Pass => {
            println!(
                "{TERM_STYLE_BOLD}{TERM_STYLE_GREEN}\nPublished artifact matches its source in {elapsed_time:.2}s.{TERM_STYLE_RESET}"
            );

            ExitCode::SUCCESS
        }
        Verdict::Fail { diverged } => {
            for diff in diverged {
                print_file_diff(diff);
            }

            println!(
                "{TERM_STYLE_BOLD}{TERM_STYLE_RED}\nFound unaccounted content in {} file(s) in {elapsed_time:.2}s.{TERM_STYLE_RESET}",
                diverged.len()
            );

            ExitCode::FAILURE
        }
    };

    if let Some(path) = retained_at {
        println!("Working trees retained at {} for inspection.", path.display());
    }

    exit_code
}

fn print_file_diff(diff: &FileDiff) {
    if diff.source_unreadable {
        println!(
            "{TERM_STYLE_BOLD}\n{} (no readable source counterpart):{TERM_STYLE_RESET}",
            diff.relative_path.display()
        );
    } else {
        println!(
            "{TERM_STYLE_BOLD}\n{}:{TERM_STYLE_RESET}",
            diff.relative_path.display()
        );
    }

    for change in &diff.changes {
        let marker = if change.added {
            "+"
        } else if change.removed {
            "-"
        } else {
            continue;
        };

        for line in change.text.split('\n') {
            println!("  {marker} {line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Change;

    fn diff_with(changes: Vec<Change>) -> FileDiff {
        FileDiff {
            relative_path: PathBuf::from("index.js"),
            changes,
            source_unreadable: false,
        }
    }

    fn added(text: &str) -> Change {
        Change {
            text: text.to_string(),
            added: true,
            removed: false,
        }
    }

    fn unchanged(text: &str) -> Change {
        Change {
            text: text.to_string(),
            added: false,
            removed: false,
        }
    }

    fn removed(text: &str) -> Change {
        Change {
            text: text.to_string(),
            added: false,
            removed: true,
        }
    }

    #[test]
    fn clean_diffs_pass() {
        let verdict = Verdict::from_diffs(vec![
            diff_with(vec![unchanged("const a = 1;")]),
            diff_with(vec![unchanged("const b = 2;"), removed("const c = 3;")]),
        ]);

        assert!(verdict.is_pass());
    }

    #[test]
    fn any_added_segment_fails() {
        let verdict = Verdict::from_diffs(vec![
            diff_with(vec![unchanged("const a = 1;")]),
            diff_with(vec![unchanged("const b = 2;"), added("send(secrets);")]),
        ]);

        match verdict {
            Verdict::Fail { diverged } => {
                assert_eq!(diverged.len(), 1);
                assert!(diverged[0].has_added_content());
            }
            Verdict::Pass => panic!("expected the verdict to fail"),
        }
    }

    #[test]
    fn empty_diff_list_passes() {
        assert!(Verdict::from_diffs(Vec::new()).is_pass());
    }
}
