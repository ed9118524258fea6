use crate::acquire::Acquirer;
use crate::config::Config;
use crate::error::CheckError;
use crate::pkg::PackageSpec;
use crate::verdict::{print_verdict, Verdict};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

mod acquire;
mod build;
mod compare;
mod config;
mod error;
mod git;
mod npm;
mod pkg;
mod shell;
mod tarball;
mod tree;
mod verdict;

fn get_spec_from_args() -> Result<PackageSpec, CheckError> {
    let args: Vec<String> = env::args().collect();

    if args.len().ne(&2) {
        return Err(CheckError::Metadata(
            "Expected only one argument: the package to verify, as name@version.".to_string(),
        ));
    }

    PackageSpec::parse(args.last().unwrap())
}

/// Builds the run configuration. Every environment variable the process
/// honors is enumerated here; nothing else reads the environment.
fn get_config_from_env() -> Config {
    let mut config = Config {
        auth_token: env::var("PROVENANCE_REGISTRY_TOKEN").ok(),
        build_id: env::var("PROVENANCE_BUILD_ID").ok(),
        webhook_target: env::var("PROVENANCE_WEBHOOK_TARGET").ok(),
        ..Config::default()
    };

    if let Some(registry_url) = env::var("PROVENANCE_REGISTRY_URL")
        .ok()
        .and_then(|value| value.parse().ok())
    {
        config.registry_url = registry_url;
    }

    if let Some(timeout_secs) = env::var("PROVENANCE_COMMAND_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
    {
        config.command_timeout = Some(Duration::from_secs(timeout_secs));
    }

    if let Ok(value) = env::var("PROVENANCE_RETAIN_WORKING_TREES") {
        config.retain_working_trees = value.ne("0") && value.ne("false");
    }

    if let Ok(value) = env::var("PROVENANCE_VERIFY_INTEGRITY") {
        config.verify_tarball_integrity = value.eq("1") || value.eq("true");
    }

    config
}

struct RunOutcome {
    verdict: Verdict,
    retained_at: Option<PathBuf>,
}

fn run(config: &Config, spec: &PackageSpec) -> Result<RunOutcome, CheckError> {
    println!("Verifying {}@{}...", spec.name, spec.version);

    let acquisition = Acquirer::new(config).acquire(spec)?;

    println!("Comparing built trees...");

    let diffs = compare::compare_trees(
        acquisition.source_tree.path(),
        acquisition.artifact_tree.path(),
    )?;

    Ok(RunOutcome {
        verdict: Verdict::from_diffs(diffs),
        retained_at: acquisition.finish()?,
    })
}

fn main() -> ExitCode {
    let start_timestamp = Instant::now();

    let spec = match get_spec_from_args() {
        Ok(spec) => spec,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let config = get_config_from_env();

    match run(&config, &spec) {
        Ok(outcome) => print_verdict(&outcome.verdict, &outcome.retained_at, start_timestamp),
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
