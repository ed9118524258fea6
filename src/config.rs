use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Everything a check run is allowed to consult. Components receive this
/// struct at construction; nothing reads the process environment ambiently.
#[derive(Debug, Clone)]
pub struct Config {
    pub registry_url: Url,
    /// Parent directory for per-run scratch roots.
    pub scratch_dir: PathBuf,
    /// Keep the built trees on disk after the run for manual inspection.
    pub retain_working_trees: bool,
    /// Verify the SSRI `sha512` integrity of the downloaded tarball when
    /// the registry provides one. The legacy SHA-1 `shasum` is never
    /// verified.
    pub verify_tarball_integrity: bool,
    /// Deadline applied to every subprocess and HTTP call. `None` lets
    /// installs, builds, and clones run to completion or failure.
    pub command_timeout: Option<Duration>,
    pub auth_token: Option<String>,
    pub build_id: Option<String>,
    pub webhook_target: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            registry_url: Url::parse("https://registry.npmjs.org/").unwrap(),
            scratch_dir: env::temp_dir(),
            retain_working_trees: true,
            verify_tarball_integrity: false,
            command_timeout: None,
            auth_token: None,
            build_id: None,
            webhook_target: None,
        }
    }
}
