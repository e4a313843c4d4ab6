//! `package.json` access with key order preserved.

use crate::error::{PackageError, Result};
use semver::Version;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File name of an npm package descriptor
pub const DESCRIPTOR_FILE: &str = "package.json";

/// Dependency sections that may reference sibling packages
pub const DEPENDENCY_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Parsed `package.json`
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    path: PathBuf,
    data: Map<String, Value>,
}

impl PackageDescriptor {
    /// Wrap a parsed JSON object read from `path`
    pub fn from_value(path: impl Into<PathBuf>, value: Value) -> Result<Self> {
        let path = path.into();
        match value {
            Value::Object(data) => Ok(Self { path, data }),
            _ => Err(PackageError::InvalidDescriptor {
                path,
                reason: "top-level value is not an object".to_string(),
            }
            .into()),
        }
    }

    /// Parse descriptor text read from `path`
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value: Value = serde_json::from_str(content).map_err(|e| PackageError::InvalidDescriptor {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::from_value(path, value)
    }

    /// Serialise with two-space indentation and a trailing newline
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.data)?;
        out.push('\n');
        Ok(out)
    }

    /// Location of the descriptor file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// `name`
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// `version` as written
    pub fn version_str(&self) -> Option<&str> {
        self.str_field("version")
    }

    /// `version` parsed as semver
    pub fn version(&self) -> Result<Version> {
        let raw = self.version_str().ok_or_else(|| self.invalid("missing \"version\""))?;
        Version::parse(raw).map_err(|e| self.invalid(&format!("invalid version '{raw}': {e}")).into())
    }

    /// `repository` as a string or `{ "url": ... }`
    pub fn repository_url(&self) -> Option<&str> {
        match self.data.get("repository") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(o)) => o.get("url").and_then(Value::as_str),
            _ => None,
        }
    }

    /// `private: true`
    pub fn is_private(&self) -> bool {
        self.data.get("private").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Whether `scripts.<name>` is defined
    pub fn has_script(&self, name: &str) -> bool {
        self.data
            .get("scripts")
            .and_then(Value::as_object)
            .is_some_and(|s| s.contains_key(name))
    }

    /// `workspaces` as an array or `{ "packages": [...] }`
    pub fn workspaces(&self) -> Vec<String> {
        let list = match self.data.get("workspaces") {
            Some(Value::Array(a)) => Some(a),
            Some(Value::Object(o)) => o.get("packages").and_then(Value::as_array),
            _ => None,
        };
        list.map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    /// Names across every dependency section
    pub fn dependency_names(&self) -> Vec<String> {
        DEPENDENCY_SECTIONS
            .iter()
            .filter_map(|section| self.data.get(*section).and_then(Value::as_object))
            .flat_map(|deps| deps.keys().cloned())
            .collect()
    }

    /// Set `version`
    pub fn set_version(&mut self, version: &Version) {
        self.data
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Point every reference to `dependency` at `version`, keeping its range operator.
    ///
    /// Returns how many sections were rewritten. `workspace:`/`file:` style
    /// specifiers and `*` are left alone.
    pub fn set_dependency_version(&mut self, dependency: &str, version: &Version) -> usize {
        let mut changed = 0;
        for section in DEPENDENCY_SECTIONS {
            let Some(Value::Object(deps)) = self.data.get_mut(section) else {
                continue;
            };
            let Some(Value::String(current)) = deps.get_mut(dependency) else {
                continue;
            };
            if let Some(updated) = rewrite_range(current, version) {
                *current = updated;
                changed += 1;
            }
        }
        changed
    }

    fn invalid(&self, reason: &str) -> PackageError {
        PackageError::InvalidDescriptor {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

/// New range string for `current` pointing at `version`, or `None` to keep it
pub fn rewrite_range(current: &str, version: &Version) -> Option<String> {
    let trimmed = current.trim();
    if trimmed.is_empty() || trimmed == "*" || trimmed.contains(':') {
        return None;
    }
    let operator: String = trimmed
        .chars()
        .take_while(|c| matches!(c, '^' | '~' | '>' | '<' | '='))
        .collect();
    Some(format!("{operator}{version}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "name": "@scope/core",
  "version": "1.2.3",
  "repository": { "type": "git", "url": "git+https://github.com/scope/tools.git" },
  "scripts": { "build": "tsc" },
  "dependencies": { "@scope/utils": "^1.0.0", "left-pad": "1.3.0" },
  "devDependencies": { "@scope/utils": "~1.0.0", "@scope/local": "workspace:*" }
}"#;

    fn sample() -> PackageDescriptor {
        PackageDescriptor::parse("package.json", SAMPLE).unwrap()
    }

    #[test]
    fn test_reads_fields() {
        let d = sample();
        assert_eq!(d.name(), Some("@scope/core"));
        assert_eq!(d.version().unwrap(), Version::new(1, 2, 3));
        assert_eq!(d.repository_url(), Some("git+https://github.com/scope/tools.git"));
        assert!(d.has_script("build"));
        assert!(!d.has_script("translations"));
        assert!(!d.is_private());
    }

    #[test]
    fn test_rewrites_dependency_ranges() {
        let mut d = sample();
        let changed = d.set_dependency_version("@scope/utils", &Version::new(1, 1, 0));
        assert_eq!(changed, 2);
        let out = d.to_pretty_string().unwrap();
        assert!(out.contains(r#""@scope/utils": "^1.1.0""#));
        assert!(out.contains(r#""@scope/utils": "~1.1.0""#));
        assert!(out.contains(r#""left-pad": "1.3.0""#));
    }

    #[test]
    fn test_workspace_protocol_untouched() {
        let mut d = sample();
        assert_eq!(d.set_dependency_version("@scope/local", &Version::new(2, 0, 0)), 0);
    }

    #[test]
    fn test_key_order_preserved() {
        let mut d = sample();
        d.set_version(&Version::new(1, 3, 0));
        let out = d.to_pretty_string().unwrap();
        let name = out.find("\"name\"").unwrap();
        let version = out.find("\"version\"").unwrap();
        let scripts = out.find("\"scripts\"").unwrap();
        assert!(name < version && version < scripts);
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_workspaces_forms() {
        let array = PackageDescriptor::parse("p", r#"{"workspaces":["packages/*"]}"#).unwrap();
        assert_eq!(array.workspaces(), vec!["packages/*"]);
        let object =
            PackageDescriptor::parse("p", r#"{"workspaces":{"packages":["libs/*"]}}"#).unwrap();
        assert_eq!(object.workspaces(), vec!["libs/*"]);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(PackageDescriptor::parse("p", "[]").is_err());
    }

    #[test]
    fn test_rewrite_range_operators() {
        let v = Version::new(3, 0, 1);
        assert_eq!(rewrite_range("^2.0.0", &v).as_deref(), Some("^3.0.1"));
        assert_eq!(rewrite_range(">=2.0.0", &v).as_deref(), Some(">=3.0.1"));
        assert_eq!(rewrite_range("2.0.0", &v).as_deref(), Some("3.0.1"));
        assert_eq!(rewrite_range("*", &v), None);
        assert_eq!(rewrite_range("file:../x", &v), None);
    }
}
