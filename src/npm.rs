use crate::config::Config;
use crate::error::CheckError;
use crate::pkg::PackageSpec;
use json::JsonValue;
use reqwest::blocking::Client;
use url::Url;

/// The slice of a registry version document this check depends on.
#[derive(Debug, Clone)]
pub struct RegistryMetadata {
    pub repository_url: Url,
    pub dist: Dist,
}

#[derive(Debug, Clone)]
pub struct Dist {
    pub tarball_url: Url,
    pub shasum: Option<String>,
    pub integrity: Option<String>,
}

pub fn http_client(config: &Config) -> Result<Client, CheckError> {
    let client = Client::builder().timeout(config.command_timeout).build()?;

    Ok(client)
}

/// Fetches and validates the version document for `name@version`. All
/// repository validation happens here, before anything touches the remote.
pub fn fetch_version_metadata(
    config: &Config,
    spec: &PackageSpec,
) -> Result<RegistryMetadata, CheckError> {
    let request_url = config
        .registry_url
        .join(&format!("{}/{}", spec.name, spec.version))?;

    let mut request = http_client(config)?.get(request_url.as_str());

    if let Some(token) = &config.auth_token {
        request = request.bearer_auth(token);
    }

    let response = request.send()?;

    if !response.status().is_success() {
        return Err(CheckError::Metadata(format!(
            "Failed to fetch package information from registry: {}.",
            response.status()
        )));
    }

    parse_version_metadata(&response.text()?)
}

pub fn parse_version_metadata(body: &str) -> Result<RegistryMetadata, CheckError> {
    let body = json::parse(body)?;

    let repository = &body["repository"];

    if !repository.is_object() {
        return Err(CheckError::Metadata(
            "Registry package missing repository information.".to_string(),
        ));
    }

    if !repository["type"].is_string() {
        return Err(CheckError::Metadata(
            "Registry package missing repository type.".to_string(),
        ));
    }

    let repository_type = repository["type"].to_string();

    if repository_type.ne("git") {
        return Err(CheckError::UnsupportedRepository(repository_type));
    }

    if !repository["url"].is_string() {
        return Err(CheckError::Metadata(
            "Registry package missing repository URL.".to_string(),
        ));
    }

    let dist = &body["dist"];

    if !dist["tarball"].is_string() {
        return Err(CheckError::Metadata(
            "Couldn't find tarball URL for requested package version.".to_string(),
        ));
    }

    Ok(RegistryMetadata {
        repository_url: normalize_remote_url(&repository["url"].to_string())?,
        dist: Dist {
            tarball_url: Url::parse(&dist["tarball"].to_string())?,
            shasum: optional_string(&dist["shasum"]),
            integrity: optional_string(&dist["integrity"]),
        },
    })
}

/// Registries prepend a literal `git+` to repository URLs; git itself
/// does not understand that prefix.
fn normalize_remote_url(raw: &str) -> Result<Url, CheckError> {
    let raw = raw.strip_prefix("git+").unwrap_or(raw);

    Ok(Url::parse(raw)?)
}

fn optional_string(value: &JsonValue) -> Option<String> {
    if value.is_string() {
        Some(value.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version_document(repository_type: &str) -> String {
        format!(
            r#"{{
                "name": "left-pad",
                "version": "1.3.0",
                "repository": {{
                    "type": "{repository_type}",
                    "url": "git+https://example.com/left-pad.git"
                }},
                "dist": {{
                    "tarball": "https://example.com/left-pad/-/left-pad-1.3.0.tgz",
                    "shasum": "612f61c033f3a9e08e40cf25e2a32b3f90c4d9dc",
                    "integrity": "sha512-mqGW5pVwcFGP+vs4Pgusj/A="
                }}
            }}"#
        )
    }

    #[test]
    fn parses_valid_metadata() -> anyhow::Result<()> {
        let metadata = parse_version_metadata(&version_document("git"))?;

        assert_eq!(
            metadata.repository_url.as_str(),
            "https://example.com/left-pad.git"
        );
        assert_eq!(
            metadata.dist.tarball_url.as_str(),
            "https://example.com/left-pad/-/left-pad-1.3.0.tgz"
        );
        assert_eq!(
            metadata.dist.shasum.as_deref(),
            Some("612f61c033f3a9e08e40cf25e2a32b3f90c4d9dc")
        );
        assert!(metadata.dist.integrity.is_some());

        Ok(())
    }

    #[test]
    fn rejects_non_git_repository() {
        let result = parse_version_metadata(&version_document("svn"));

        assert!(matches!(
            result,
            Err(CheckError::UnsupportedRepository(kind)) if kind == "svn"
        ));
    }

    #[test]
    fn rejects_missing_repository() {
        let result = parse_version_metadata(r#"{"name": "left-pad", "version": "1.3.0"}"#);

        assert!(matches!(result, Err(CheckError::Metadata(_))));
    }

    #[test]
    fn rejects_missing_tarball() {
        let body = r#"{
            "repository": {"type": "git", "url": "https://example.com/a.git"},
            "dist": {}
        }"#;

        assert!(matches!(
            parse_version_metadata(body),
            Err(CheckError::Metadata(_))
        ));
    }

    #[test]
    fn strips_git_prefix_from_remote_url() -> anyhow::Result<()> {
        let url = normalize_remote_url("git+ssh://git@example.com/a.git")?;

        assert_eq!(url.as_str(), "ssh://git@example.com/a.git");

        Ok(())
    }

    #[test]
    fn absent_optional_dist_fields_are_none() -> anyhow::Result<()> {
        let body = r#"{
            "repository": {"type": "git", "url": "https://example.com/a.git"},
            "dist": {"tarball": "https://example.com/a.tgz"}
        }"#;

        let metadata = parse_version_metadata(body)?;

        assert!(metadata.dist.shasum.is_none());
        assert!(metadata.dist.integrity.is_none());

        Ok(())
    }
}
