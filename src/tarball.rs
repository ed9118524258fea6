use crate::config::Config;
use crate::error::CheckError;
use crate::npm::{self, Dist};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::bufread::GzDecoder;
use hmac_sha512::Hash;
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

const ARCHIVE_FILE_NAME: &str = "package.tgz";

/// Downloads the published tarball into `dest`, verifies its integrity
/// when configured to, and extracts it with the `package/` wrapper
/// directory flattened away. The archive file itself is left behind in
/// `dest`; the housekeeping strip removes it before comparison.
pub fn fetch_and_extract(config: &Config, dist: &Dist, dest: &Path) -> Result<(), CheckError> {
    println!("Downloading tarball from registry...");

    let response = npm::http_client(config)?
        .get(dist.tarball_url.as_str())
        .send()
        .map_err(|error| CheckError::Download(error.to_string()))?;

    if !response.status().is_success() {
        return Err(CheckError::Download(format!(
            "Failed to download tarball from '{}': {}.",
            dist.tarball_url,
            response.status()
        )));
    }

    let data = response
        .bytes()
        .map_err(|error| CheckError::Download(error.to_string()))?
        .to_vec();

    if config.verify_tarball_integrity {
        verify_integrity(dist, &data)?;
    }

    fs::write(dest.join(ARCHIVE_FILE_NAME), &data)?;
    extract_archive(&data, dest)
}

/// Checks the SSRI `sha512-<base64>` integrity string against the raw
/// archive bytes. Versions that only publish the legacy SHA-1 `shasum`
/// are accepted without verification.
fn verify_integrity(dist: &Dist, data: &[u8]) -> Result<(), CheckError> {
    let Some(integrity) = &dist.integrity else {
        println!("No sha512 integrity published for this version. Skipping verification...");
        return Ok(());
    };

    let Some(expected) = integrity.strip_prefix("sha512-") else {
        println!("Unrecognized integrity algorithm '{integrity}'. Skipping verification...");
        return Ok(());
    };

    let mut hash = Hash::new();
    hash.update(data);

    let computed = BASE64.encode(hash.finalize());

    if computed.ne(expected) {
        return Err(CheckError::Checksum {
            expected: expected.to_string(),
            computed,
        });
    }

    println!("Integrity OK.");
    Ok(())
}

/// Unpacks a gzipped tar stream into `dest`. npm wraps every package in
/// a single top-level `package/` directory; that component is dropped so
/// the extracted layout matches a repository checkout.
pub fn extract_archive(data: &[u8], dest: &Path) -> Result<(), CheckError> {
    let mut tarball = Vec::new();
    let mut decoder = GzDecoder::new(data);

    decoder.read_to_end(&mut tarball)?;

    let mut archive = Archive::new(&tarball[..]);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.to_path_buf();

        let Some(flattened) = flatten_wrapper(&entry_path) else {
            continue;
        };

        let target = dest.join(flattened);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&target)?;
    }

    Ok(())
}

fn flatten_wrapper(entry_path: &Path) -> Option<PathBuf> {
    let flattened = entry_path
        .strip_prefix("package")
        .unwrap_or(entry_path)
        .to_path_buf();

    // The wrapper directory entry itself flattens to nothing, and a
    // hostile archive could smuggle absolute or parent-escaping paths.
    let is_safe = !flattened.as_os_str().is_empty()
        && flattened
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if is_safe {
        Some(flattened)
    } else {
        None
    }
}
