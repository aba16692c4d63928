//! Which artifacts get patched, and with what

use std::collections::BTreeSet;

/// Text appended to every matched `__init__.py`
pub const PAYLOAD: &str = r#"print("hello world")"#;

/// Initializer file that marks a directory as an importable package
pub const INIT_FILE: &str = "__init__.py";

/// Extension of zip-based wheel distributions
pub const WHEEL_EXTENSION: &str = ".whl";

/// Package allow-list for patching, fixed for the process lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    packages: BTreeSet<String>,
}

impl RuleSet {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether artifacts of this package are patched
    pub fn applies_to(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    /// Whether this (package, filename) pair goes through the transformer
    pub fn should_transform(&self, package: &str, filename: &str) -> bool {
        self.applies_to(package) && is_wheel(filename)
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }
}

/// Whether the filename names a wheel
pub fn is_wheel(filename: &str) -> bool {
    filename.ends_with(WHEEL_EXTENSION)
}

/// The line block appended to each matched initializer
pub fn injected_block() -> String {
    format!("\n\n{}\n", PAYLOAD)
}

/// Whether a top-level directory in a wheel holds the package's own code
///
/// Hyphens in the package name correspond to underscores in the directory
/// name, and the comparison ignores case.
pub fn is_package_dir(dir_name: &str, package: &str) -> bool {
    dir_name.to_lowercase() == package.replace('-', "_").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_membership() {
        let rules = RuleSet::new(["requests"]);
        assert!(rules.applies_to("requests"));
        assert!(!rules.applies_to("urllib3"));
        assert!(!RuleSet::default().applies_to("requests"));
    }

    #[test]
    fn only_wheels_are_transformed() {
        let rules = RuleSet::new(["demo"]);
        assert!(rules.should_transform("demo", "demo-1.0-py3-none-any.whl"));
        assert!(!rules.should_transform("demo", "demo-1.0.tar.gz"));
        assert!(!rules.should_transform("other", "other-1.0-py3-none-any.whl"));
    }

    #[test]
    fn package_dir_normalization() {
        assert!(is_package_dir("demo", "demo"));
        assert!(is_package_dir("my_pkg", "my-pkg"));
        assert!(is_package_dir("My_Pkg", "my-PKG"));
        assert!(!is_package_dir("my_pkg-1.0.dist-info", "my-pkg"));
        assert!(!is_package_dir("mypkg", "my-pkg"));
    }

    #[test]
    fn injected_block_ends_with_payload() {
        let block = injected_block();
        assert!(block.starts_with("\n\n"));
        assert!(block.ends_with(&format!("{}\n", PAYLOAD)));
    }
}
