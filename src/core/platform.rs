//! Platform minimums.
//!
//! A package declares the lowest OS version it supports for each platform
//! family it targets, e.g. `macos = "10.15"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A platform family a package can declare a minimum for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    #[serde(alias = "osx")]
    Macos,
    Ios,
    Tvos,
    Watchos,
    Linux,
    Windows,
}

impl PlatformFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformFamily::Macos => "macos",
            PlatformFamily::Ios => "ios",
            PlatformFamily::Tvos => "tvos",
            PlatformFamily::Watchos => "watchos",
            PlatformFamily::Linux => "linux",
            PlatformFamily::Windows => "windows",
        }
    }

    /// Human-facing name, as used in release notes and `describe` output.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformFamily::Macos => "macOS",
            PlatformFamily::Ios => "iOS",
            PlatformFamily::Tvos => "tvOS",
            PlatformFamily::Watchos => "watchOS",
            PlatformFamily::Linux => "Linux",
            PlatformFamily::Windows => "Windows",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "osx" => Ok(PlatformFamily::Macos),
            "ios" => Ok(PlatformFamily::Ios),
            "tvos" => Ok(PlatformFamily::Tvos),
            "watchos" => Ok(PlatformFamily::Watchos),
            "linux" => Ok(PlatformFamily::Linux),
            "windows" => Ok(PlatformFamily::Windows),
            _ => Err(format!(
                "unknown platform `{}`; expected one of macos, ios, tvos, watchos, linux, windows",
                s
            )),
        }
    }
}

/// A dotted OS version such as `10.15` or `13.0.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformVersion {
    components: Vec<u32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid platform version `{0}`: expected dotted numbers like `10.15`")]
pub struct PlatformVersionError(pub String);

impl PlatformVersion {
    pub fn components(&self) -> &[u32] {
        &self.components
    }
}

impl FromStr for PlatformVersion {
    type Err = PlatformVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if s.is_empty() || parts.len() > 3 {
            return Err(PlatformVersionError(s.to_string()));
        }

        let components = parts
            .iter()
            .map(|p| p.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PlatformVersionError(s.to_string()))?;

        Ok(PlatformVersion { components })
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

/// One declared platform minimum.
///
/// The version is kept as written; `check` reports versions that do not
/// parse instead of the loader rejecting the whole manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub family: PlatformFamily,
    pub min_version: String,
}

impl Platform {
    pub fn new(family: PlatformFamily, min_version: impl Into<String>) -> Self {
        Platform {
            family,
            min_version: min_version.into(),
        }
    }

    pub fn parsed_version(&self) -> Result<PlatformVersion, PlatformVersionError> {
        self.min_version.parse()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family.display_name(), self.min_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_family() {
        assert_eq!("macOS".parse::<PlatformFamily>().unwrap(), PlatformFamily::Macos);
        assert_eq!("osx".parse::<PlatformFamily>().unwrap(), PlatformFamily::Macos);
        assert_eq!("watchos".parse::<PlatformFamily>().unwrap(), PlatformFamily::Watchos);
        assert!("beos".parse::<PlatformFamily>().is_err());
    }

    #[test]
    fn test_parse_version() {
        let v: PlatformVersion = "10.15".parse().unwrap();
        assert_eq!(v.components(), &[10, 15]);
        assert_eq!(v.to_string(), "10.15");

        assert!("10.x".parse::<PlatformVersion>().is_err());
        assert!("".parse::<PlatformVersion>().is_err());
        assert!("1.2.3.4".parse::<PlatformVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let a: PlatformVersion = "10.9".parse().unwrap();
        let b: PlatformVersion = "10.15".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_platform_display() {
        let p = Platform::new(PlatformFamily::Macos, "10.15");
        assert_eq!(p.to_string(), "macOS 10.15");
    }
}
