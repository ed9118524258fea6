use crate::error::CheckError;

/// The package identity a check runs against, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
}

impl PackageSpec {
    pub fn new(name: &str, version: &str) -> Self {
        PackageSpec {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    /// Parses a `name@version` argument. Scoped packages keep their
    /// leading `@`, so the separator is the last `@` in the string.
    pub fn parse(argument: &str) -> Result<Self, CheckError> {
        let separator = argument.rfind('@').filter(|index| index.gt(&0));

        let Some(separator) = separator else {
            return Err(CheckError::Metadata(format!(
                "Expected 'name@version', got '{argument}'."
            )));
        };

        let name = &argument[..separator];
        let version = &argument[separator + 1..];

        if name.is_empty() || version.is_empty() {
            return Err(CheckError::Metadata(format!(
                "Expected 'name@version', got '{argument}'."
            )));
        }

        Ok(PackageSpec::new(name, version))
    }

    /// A filesystem-safe rendition of the package name, used to prefix
    /// the per-run scratch directory.
    pub fn dir_safe_name(&self) -> String {
        self.name.replace(['@', '/'], "-")
    }
}
