//! YAML fixture manifests
//!
//! ```yaml
//! fixtures:
//!   - name: zlib_live
//!     live_dependency_includes: [external/ZLIB, external/ZLIB/build_external_dep]
//!   - name: zlib_pkgconfig
//!     skip_on: [windows]
//! ```

use serde::Deserialize;
use std::path::Path;

use super::{builtin_cases, FixtureCase};
use crate::common::config::FixturesConfig;
use crate::common::{Error, Result};

/// Top-level manifest document
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub fixtures: Vec<FixtureCase>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml::from_str(content)?;
        if let Some(dup) = first_duplicate(&manifest.fixtures) {
            return Err(Error::Config(format!(
                "Fixture '{}' is listed more than once",
                dup
            )));
        }
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }
}

fn first_duplicate(cases: &[FixtureCase]) -> Option<&str> {
    cases.iter().enumerate().find_map(|(i, case)| {
        cases[..i]
            .iter()
            .any(|earlier| earlier.name == case.name)
            .then_some(case.name.as_str())
    })
}

/// Fixture cases from the configured manifest, or the built-in list
pub fn load_cases(config: &FixturesConfig) -> Result<Vec<FixtureCase>> {
    match &config.manifest {
        Some(path) => Ok(Manifest::from_file(path)?.fixtures),
        None => Ok(builtin_cases()),
    }
}

/// Keep the cases named in `names`, in the order given; all cases when empty
pub fn select_cases(cases: Vec<FixtureCase>, names: &[String]) -> Result<Vec<FixtureCase>> {
    if names.is_empty() {
        return Ok(cases);
    }

    names
        .iter()
        .map(|name| {
            cases
                .iter()
                .find(|case| &case.name == name)
                .cloned()
                .ok_or_else(|| {
                    let known: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
                    Error::unknown_fixture(name, &known)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    #[test]
    fn test_parse_applies_defaults() {
        let manifest = Manifest::parse(
            r#"
fixtures:
  - name: zlib_live
    live_dependency_includes: [external/ZLIB, external/ZLIB/build_external_dep]
  - name: zlib_pkgconfig
    skip_on: [windows]
    run_tests: false
"#,
        )
        .unwrap();

        let live = &manifest.fixtures[0];
        assert_eq!(live.source_filter, "main.cpp");
        assert!(live.run_tests);
        assert_eq!(live.live_dependency_includes.len(), 2);

        let pkg = &manifest.fixtures[1];
        assert_eq!(pkg.skip_on, [Platform::Windows]);
        assert!(!pkg.run_tests);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Manifest::parse("fixtures:\n  - name: a\n  - name: a\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let err = Manifest::parse("fixtures: [name: ").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let names = vec!["zlib_pkgconfig".to_string(), "zlib_system".to_string()];
        let selected = select_cases(builtin_cases(), &names).unwrap();
        let got: Vec<&str> = selected.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(got, ["zlib_pkgconfig", "zlib_system"]);
    }

    #[test]
    fn test_select_unknown_name() {
        let err = select_cases(builtin_cases(), &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("zlib_live"));
    }

    #[test]
    fn test_load_without_manifest_uses_builtins() {
        let cases = load_cases(&FixturesConfig::default()).unwrap();
        assert_eq!(cases, builtin_cases());
    }
}
