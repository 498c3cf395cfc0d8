//! Implementation of `swiftcli describe`.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{Manifest, Requirement, Target, TargetDependency};

/// Serializable view of a manifest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_version: Option<String>,
    pub language_versions: Vec<String>,
    pub platforms: Vec<PlatformDescription>,
    pub products: Vec<ProductDescription>,
    pub dependencies: Vec<DependencyDescription>,
    pub targets: Vec<TargetDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformDescription {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDescription {
    pub name: String,
    /// `executable`, `library`, `library (dynamic)`, ...
    pub kind: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyDescription {
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    pub requirement: RequirementDescription,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RequirementDescription {
    Range {
        lower: String,
        /// Absent when the range has no upper bound
        #[serde(skip_serializing_if = "Option::is_none")]
        upper: Option<String>,
    },
    Exact { version: String },
    Branch { name: String },
    Revision { revision: String },
    Local,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetDescription {
    pub name: String,
    pub kind: String,
    pub path: String,
    pub dependencies: Vec<String>,
}

/// Build the description of a manifest.
pub fn describe(manifest: &Manifest) -> PackageDescription {
    PackageDescription {
        name: manifest.name.clone(),
        tools_version: manifest.tools_version.clone(),
        language_versions: manifest.language_versions.clone(),
        platforms: manifest
            .platforms
            .iter()
            .map(|p| PlatformDescription {
                name: p.family.as_str().to_string(),
                version: p.min_version.clone(),
            })
            .collect(),
        products: manifest
            .products
            .iter()
            .map(|p| ProductDescription {
                name: p.name.clone(),
                kind: p.describe_kind(),
                targets: p.targets.clone(),
            })
            .collect(),
        dependencies: manifest
            .dependencies
            .iter()
            .map(|d| DependencyDescription {
                identity: d.identity(),
                name: (d.display_name() != d.identity()).then(|| d.display_name()),
                location: d.location().as_string(),
                requirement: describe_requirement(d.requirement()),
            })
            .collect(),
        targets: manifest.targets.iter().map(describe_target).collect(),
    }
}

fn describe_requirement(req: &Requirement) -> RequirementDescription {
    match req {
        Requirement::UpToNextMajor(v) | Requirement::UpToNextMinor(v) => {
            RequirementDescription::Range {
                lower: v.to_string(),
                upper: req.next_bound().map(|b| b.to_string()),
            }
        }
        Requirement::Range { lower, upper } => RequirementDescription::Range {
            lower: lower.to_string(),
            upper: Some(upper.to_string()),
        },
        Requirement::Exact(v) => RequirementDescription::Exact {
            version: v.to_string(),
        },
        Requirement::Branch(name) => RequirementDescription::Branch { name: name.clone() },
        Requirement::Revision(rev) => RequirementDescription::Revision {
            revision: rev.clone(),
        },
        Requirement::Local => RequirementDescription::Local,
    }
}

fn describe_target(target: &Target) -> TargetDescription {
    TargetDescription {
        name: target.name.clone(),
        kind: target.kind.to_string(),
        path: target.source_dir().display().to_string(),
        dependencies: target
            .dependencies
            .iter()
            .map(|dep| match dep {
                TargetDependency::Product { .. } => dep.to_string(),
                _ => dep.name().to_string(),
            })
            .collect(),
    }
}

/// Render the description as pretty JSON.
pub fn to_json(description: &PackageDescription) -> Result<String> {
    serde_json::to_string_pretty(description).context("failed to serialize package description")
}

/// Render the description as indented text.
pub fn to_text(manifest: &Manifest) -> String {
    let mut out = String::new();

    // writeln! into a String cannot fail
    let _ = writeln!(out, "Name: {}", manifest.name);
    if let Some(tools) = &manifest.tools_version {
        let _ = writeln!(out, "Tools version: {}", tools);
    }
    if !manifest.language_versions.is_empty() {
        let _ = writeln!(
            out,
            "Language versions: {}",
            manifest.language_versions.join(", ")
        );
    }

    if !manifest.platforms.is_empty() {
        let _ = writeln!(out, "Platforms:");
        for platform in &manifest.platforms {
            let _ = writeln!(out, "    {}", platform);
        }
    }

    if !manifest.dependencies.is_empty() {
        let _ = writeln!(out, "Dependencies:");
        for dep in &manifest.dependencies {
            let _ = writeln!(
                out,
                "    {} {} ({})",
                dep.display_name(),
                dep.location(),
                dep.requirement()
            );
        }
    }

    if !manifest.products.is_empty() {
        let _ = writeln!(out, "Products:");
        for product in &manifest.products {
            let _ = writeln!(out, "    Name: {}", product.name);
            let _ = writeln!(out, "    Kind: {}", product.describe_kind());
            let _ = writeln!(out, "    Targets: {}", product.targets.join(", "));
            let _ = writeln!(out);
        }
    }

    if !manifest.targets.is_empty() {
        let _ = writeln!(out, "Targets:");
        for target in &manifest.targets {
            let described = describe_target(target);
            let _ = writeln!(out, "    Name: {}", described.name);
            let _ = writeln!(out, "    Kind: {}", described.kind);
            let _ = writeln!(out, "    Path: {}", described.path);
            if !described.dependencies.is_empty() {
                let _ = writeln!(out, "    Dependencies: {}", described.dependencies.join(", "));
            }
            let _ = writeln!(out);
        }
    }

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures;

    #[test]
    fn test_json_description() {
        let manifest = fixtures::manifest(fixtures::SWIFTCLI_MANIFEST);
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&describe(&manifest)).unwrap()).unwrap();

        assert_eq!(json["name"], "SwiftCLI");
        assert_eq!(json["toolsVersion"], "5.2");
        assert_eq!(json["platforms"][0]["name"], "macos");
        assert_eq!(json["platforms"][0]["version"], "10.15");
        assert_eq!(json["products"][1]["kind"], "library (dynamic)");
        assert_eq!(json["dependencies"][0]["identity"], "swift-argument-parser");
        assert_eq!(json["dependencies"][0]["requirement"]["kind"], "range");
        assert_eq!(json["dependencies"][0]["requirement"]["upper"], "1.0.0");
        assert_eq!(json["targets"][1]["dependencies"][0], "ArgumentParser (swift-argument-parser)");
        assert_eq!(json["targets"][2]["path"], "Tests/SwiftCLIKitTests");
    }

    #[test]
    fn test_text_description() {
        let manifest = fixtures::manifest(fixtures::SWIFTCLI_MANIFEST);
        let text = to_text(&manifest);

        assert!(text.starts_with("Name: SwiftCLI\nTools version: 5.2\n"));
        assert!(text.contains("    macOS 10.15\n"));
        assert!(text.contains(
            "    nimble https://github.com/Quick/Nimble (8.0.9 ..< 9.0.0)\n"
        ));
        assert!(text.contains("    Kind: library (dynamic)\n"));
        assert!(text.contains("    Dependencies: SwiftCLIKit, Quick, Nimble\n"));
        assert!(text.ends_with("Nimble\n"));
    }

    #[test]
    fn test_requirement_at_largest_major_has_no_upper() {
        let manifest = fixtures::manifest(
            r#"
[package]
name = "App"

[[dependencies]]
url = "https://github.com/Quick/Nimble"
from = "18446744073709551615"
"#,
        );
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&describe(&manifest)).unwrap()).unwrap();

        let requirement = &json["dependencies"][0]["requirement"];
        assert_eq!(requirement["lower"], "18446744073709551615.0.0");
        assert!(requirement.get("upper").is_none());
        assert!(to_text(&manifest).contains("(>= 18446744073709551615.0.0)"));
    }
}
