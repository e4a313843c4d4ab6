//! Fixed version bumps and tag coercion.

use crate::error::{Result, VersionError};
use regex::Regex;
use semver::Version;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A fixed bump applied to the last released version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum BumpType {
    /// x.y.Z
    Patch,
    /// x.Y.0
    Minor,
    /// X.0.0
    Major,
    /// Keep the version unchanged
    None,
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
            BumpType::None => "none",
        };
        f.write_str(s)
    }
}

impl FromStr for BumpType {
    type Err = VersionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(BumpType::Patch),
            "minor" => Ok(BumpType::Minor),
            "major" => Ok(BumpType::Major),
            "none" => Ok(BumpType::None),
            other => Err(VersionError::UnknownBump {
                bump: other.to_string(),
            }),
        }
    }
}

/// Apply a fixed bump to `version`.
///
/// Pre-release and build metadata are dropped by every real bump. `None`
/// returns the input untouched.
pub fn increment_version(version: &Version, bump: BumpType) -> Version {
    match bump {
        BumpType::Patch => Version::new(version.major, version.minor, version.patch + 1),
        BumpType::Minor => Version::new(version.major, version.minor + 1, 0),
        BumpType::Major => Version::new(version.major + 1, 0, 0),
        BumpType::None => version.clone(),
    }
}

/// Parse a strict semantic version, tolerating a leading `v`
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let stripped = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(stripped).map_err(|source| {
        VersionError::ParseFailed {
            version: input.to_string(),
            source,
        }
        .into()
    })
}

static VERSION_CORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version core regex is valid")
});

/// Turn a release tag into a three-component version.
///
/// Accepts `v` prefixes, extra numeric segments (`3.2.5.8`), suffixes
/// (`4.12.13-8`) and short forms (`2.1`). The first numeric run wins.
pub fn get_version_from_tag(tag: &str) -> Result<Version> {
    let caps = VERSION_CORE_RE
        .captures(tag)
        .ok_or_else(|| VersionError::Coercion {
            tag: tag.to_string(),
        })?;

    let component = |idx: usize| -> Result<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse::<u64>().map_err(|_| {
                VersionError::Coercion {
                    tag: tag.to_string(),
                }
                .into()
            }),
            None => Ok(0),
        }
    };

    Ok(Version::new(component(1)?, component(2)?, component(3)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).expect("valid test version")
    }

    #[test]
    fn test_increment_patch() {
        assert_eq!(increment_version(&v("1.2.3"), BumpType::Patch), v("1.2.4"));
    }

    #[test]
    fn test_increment_minor_resets_patch() {
        assert_eq!(increment_version(&v("1.2.3"), BumpType::Minor), v("1.3.0"));
    }

    #[test]
    fn test_increment_major_resets_minor_and_patch() {
        assert_eq!(increment_version(&v("1.2.3"), BumpType::Major), v("2.0.0"));
    }

    #[test]
    fn test_increment_none_is_noop() {
        assert_eq!(increment_version(&v("1.2.3"), BumpType::None), v("1.2.3"));
    }

    #[test]
    fn test_increment_is_strictly_greater() {
        let versions = ["0.0.0", "0.9.9", "1.2.3", "10.0.41", "2.0.0-beta.1"];
        for raw in versions {
            let last = v(raw);
            for bump in [BumpType::Patch, BumpType::Minor, BumpType::Major] {
                let next = increment_version(&last, bump);
                assert!(next > last, "{bump} of {last} gave {next}");
                assert_eq!(next, increment_version(&last, bump));
            }
        }
    }

    #[test]
    fn test_increment_drops_prerelease() {
        assert_eq!(increment_version(&v("2.0.0-rc.1"), BumpType::Patch), v("2.0.1"));
    }

    #[test]
    fn test_coerce_extra_segment() {
        assert_eq!(get_version_from_tag("3.2.5.8").unwrap(), v("3.2.5"));
    }

    #[test]
    fn test_coerce_numeric_suffix() {
        assert_eq!(get_version_from_tag("4.12.13-8").unwrap(), v("4.12.13"));
    }

    #[test]
    fn test_coerce_prefix_and_short_form() {
        assert_eq!(get_version_from_tag("v2.1").unwrap(), v("2.1.0"));
        assert_eq!(get_version_from_tag("release-7").unwrap(), v("7.0.0"));
    }

    #[test]
    fn test_coerce_is_idempotent() {
        for tag in ["3.2.5.8", "4.12.13-8", "v1.0.0", "v0.3"] {
            let once = get_version_from_tag(tag).unwrap();
            let twice = get_version_from_tag(&once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_coerce_fails_without_digits() {
        assert!(matches!(
            get_version_from_tag("latest"),
            Err(crate::ReleaseError::Version(VersionError::Coercion { .. }))
        ));
    }

    #[test]
    fn test_parse_version_accepts_v_prefix() {
        assert_eq!(parse_version("v1.4.0").unwrap(), v("1.4.0"));
        assert!(parse_version("1.4").is_err());
    }

    #[test]
    fn test_bump_from_str() {
        assert_eq!("Minor".parse::<BumpType>().unwrap(), BumpType::Minor);
        assert!("huge".parse::<BumpType>().is_err());
    }
}
