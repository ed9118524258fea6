use crate::error::CheckError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `program` with an explicit argument vector, never through a
/// shell. Returns the combined stdout/stderr on success; a non-zero exit
/// becomes `Subprocess` and deadline expiry becomes `Timeout`.
pub fn run(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<String, CheckError> {
    let command_line = render(program, args);

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CheckError::Subprocess {
            command: command_line.clone(),
            status: "failed to spawn".to_string(),
            output: source.to_string(),
        })?;

    // The pipes must be drained while we poll, or a chatty child fills
    // its pipe buffer and blocks before we ever see it exit.
    let stdout = child.stdout.take().unwrap();
    let stderr = child.stderr.take().unwrap();
    let stdout_reader = thread::spawn(move || read_all(stdout));
    let stderr_reader = thread::spawn(move || read_all(stderr));

    let status = wait_with_deadline(&mut child, &command_line, timeout)?;

    let mut output = stdout_reader.join().unwrap_or_default();
    output.push_str(&stderr_reader.join().unwrap_or_default());

    if status.success() {
        Ok(output)
    } else {
        Err(CheckError::Subprocess {
            command: command_line,
            status: status.to_string(),
            output,
        })
    }
}

fn wait_with_deadline(
    child: &mut Child,
    command_line: &str,
    timeout: Option<Duration>,
) -> Result<std::process::ExitStatus, CheckError> {
    let Some(limit) = timeout else {
        return Ok(child.wait()?);
    };

    let deadline = Instant::now() + limit;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();

            return Err(CheckError::Timeout {
                command: command_line.to_string(),
                limit,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn read_all(mut source: impl Read) -> String {
    let mut buffer = Vec::new();
    let _ = source.read_to_end(&mut buffer);

    String::from_utf8_lossy(&buffer).into_owned()
}

fn render(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn captures_output_of_successful_command() -> anyhow::Result<()> {
        let cwd = TempDir::new()?;
        let output = run("echo", &["hello"], cwd.path(), None)?;

        assert_eq!(output.trim(), "hello");

        Ok(())
    }

    #[test]
    fn failing_command_carries_command_and_output() {
        let cwd = TempDir::new().expect("failed to create temp dir");
        let result = run("ls", &["definitely-not-here"], cwd.path(), None);

        match result {
            Err(CheckError::Subprocess {
                command, output, ..
            }) => {
                assert_eq!(command, "ls definitely-not-here");
                assert!(output.contains("definitely-not-here"));
            }
            other => panic!("expected Subprocess error, got {other:?}"),
        }
    }

    #[test]
    fn expired_deadline_is_a_distinct_failure() {
        let cwd = TempDir::new().expect("failed to create temp dir");
        let result = run("sleep", &["5"], cwd.path(), Some(Duration::from_millis(200)));

        assert!(matches!(result, Err(CheckError::Timeout { .. })));
    }

    #[test]
    fn runs_in_the_given_directory() -> anyhow::Result<()> {
        let cwd = TempDir::new()?;
        std::fs::write(cwd.path().join("marker.txt"), "x")?;

        let output = run("ls", &[], cwd.path(), None)?;

        assert!(output.contains("marker.txt"));

        Ok(())
    }
}
