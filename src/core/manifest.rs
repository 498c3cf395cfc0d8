//! Package.toml manifest parsing and schema.
//!
//! The manifest is the single declarative description of a package: its
//! platform minimums, products, external dependencies and targets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

use crate::core::dependency::{DependencySpec, PackageDependency};
use crate::core::platform::{Platform, PlatformFamily};
use crate::core::product::{Linkage, Product, ProductKind};
use crate::core::target::{Target, TargetDependency, TargetKind};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Package.toml";

/// Lockfile written next to the manifest.
pub const LOCKFILE_NAME: &str = "Package.resolved";

/// TOML syntax or schema error, rendered with a pointer into the file.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse manifest: {message}")]
#[diagnostic(
    code(swiftcli::manifest::parse),
    help("see `swiftcli init --help` for a manifest template")
)]
pub struct ManifestParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

/// The parsed manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Package name
    pub name: String,

    /// Minimum manifest tools version, e.g. `5.2`
    pub tools_version: Option<String>,

    /// Supported language versions, e.g. `["5"]`
    pub language_versions: Vec<String>,

    pub platforms: Vec<Platform>,

    pub products: Vec<Product>,

    pub dependencies: Vec<PackageDependency>,

    pub targets: Vec<Target>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    package: RawPackage,

    #[serde(default)]
    platforms: BTreeMap<String, String>,

    #[serde(default)]
    products: Vec<RawProduct>,

    #[serde(default)]
    dependencies: Vec<DependencySpec>,

    #[serde(default)]
    targets: Vec<RawTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPackage {
    name: String,

    #[serde(default)]
    tools_version: Option<String>,

    #[serde(default)]
    language_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    name: String,

    kind: ProductKind,

    #[serde(default)]
    linkage: Linkage,

    #[serde(default)]
    targets: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    name: String,

    #[serde(default)]
    kind: TargetKind,

    #[serde(default)]
    path: Option<PathBuf>,

    #[serde(default)]
    dependencies: Vec<RawTargetDep>,
}

/// Raw target dependency.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTargetDep {
    Simple(String),
    Product { product: String, package: String },
    Target { target: String },
}

impl From<RawTargetDep> for TargetDependency {
    fn from(raw: RawTargetDep) -> Self {
        match raw {
            RawTargetDep::Simple(name) => TargetDependency::ByName { name },
            RawTargetDep::Product { product, package } => TargetDependency::Product {
                name: product,
                package,
            },
            RawTargetDep::Target { target } => TargetDependency::Target { name: target },
        }
    }
}

/// What a target dependency refers to once looked up in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTargetDependency<'a> {
    Target(&'a Target),
    Product {
        product: &'a str,
        package: &'a PackageDependency,
    },
    Unknown,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ManifestParseError {
            message: e.message().to_string(),
            src: NamedSource::new(path.display().to_string(), content.to_string()),
            span: e.span().map(SourceSpan::from),
        })?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut platforms = Vec::new();
        for (family, version) in raw.platforms {
            let family: PlatformFamily = family
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("invalid [platforms] entry in {}", path.display()))?;
            platforms.push(Platform::new(family, version));
        }

        let mut dependencies = Vec::new();
        for (index, spec) in raw.dependencies.iter().enumerate() {
            let dep = spec.to_dependency(&manifest_dir).with_context(|| {
                format!(
                    "invalid [[dependencies]] entry #{} in {}",
                    index + 1,
                    path.display()
                )
            })?;
            dependencies.push(dep);
        }

        let products = raw
            .products
            .into_iter()
            .map(|p| Product {
                name: p.name,
                kind: p.kind,
                linkage: p.linkage,
                targets: p.targets,
            })
            .collect();

        let targets = raw
            .targets
            .into_iter()
            .map(|t| Target {
                name: t.name,
                kind: t.kind,
                path: t.path,
                dependencies: t.dependencies.into_iter().map(Into::into).collect(),
            })
            .collect();

        tracing::debug!("loaded manifest for `{}` from {}", raw.package.name, path.display());

        Ok(Manifest {
            name: raw.package.name,
            tools_version: raw.package.tools_version,
            language_versions: raw.package.language_versions,
            platforms,
            products,
            dependencies,
            targets,
            manifest_dir,
        })
    }

    /// Get a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Get a product by name.
    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Find the external dependency a `package:` reference points at.
    pub fn dependency(&self, reference: &str) -> Option<&PackageDependency> {
        self.dependencies
            .iter()
            .find(|d| d.matches_reference(reference))
    }

    /// Test targets, in declaration order.
    pub fn test_targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| t.is_test())
    }

    /// Look up what a target dependency refers to.
    ///
    /// By-name dependencies prefer a local target and fall back to the
    /// product of the same-named package.
    pub fn resolve_target_dependency<'a>(
        &'a self,
        dep: &'a TargetDependency,
    ) -> ResolvedTargetDependency<'a> {
        match dep {
            TargetDependency::Target { name } => match self.target(name) {
                Some(target) => ResolvedTargetDependency::Target(target),
                None => ResolvedTargetDependency::Unknown,
            },
            TargetDependency::Product { name, package } => match self.dependency(package) {
                Some(package) => ResolvedTargetDependency::Product {
                    product: name,
                    package,
                },
                None => ResolvedTargetDependency::Unknown,
            },
            TargetDependency::ByName { name } => {
                if let Some(target) = self.target(name) {
                    ResolvedTargetDependency::Target(target)
                } else if let Some(package) = self.dependency(name) {
                    ResolvedTargetDependency::Product {
                        product: name,
                        package,
                    }
                } else {
                    ResolvedTargetDependency::Unknown
                }
            }
        }
    }

    /// Path of the lockfile belonging to this manifest.
    pub fn lockfile_path(&self) -> PathBuf {
        self.manifest_dir.join(LOCKFILE_NAME)
    }
}

/// Find the manifest by walking up from `start`.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}

/// Package layout produced by `swiftcli init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestTemplate {
    /// Library product, library target and its test target
    #[default]
    Library,
    /// Single executable product and target
    Executable,
    /// Executable + dynamic `<Name>Kit` library + tests with test-framework packages
    Tool,
}

impl ManifestTemplate {
    /// Names of the targets the template declares, with their kinds.
    pub fn targets(&self, name: &str) -> Vec<(String, TargetKind)> {
        match self {
            ManifestTemplate::Library => vec![
                (name.to_string(), TargetKind::Regular),
                (format!("{}Tests", name), TargetKind::Test),
            ],
            ManifestTemplate::Executable => vec![(name.to_string(), TargetKind::Executable)],
            ManifestTemplate::Tool => vec![
                (name.to_lowercase(), TargetKind::Executable),
                (format!("{}Kit", name), TargetKind::Regular),
                (format!("{}KitTests", name), TargetKind::Test),
            ],
        }
    }
}

/// Generate a Package.toml for a new package.
pub fn generate_manifest(name: &str, template: ManifestTemplate) -> String {
    match template {
        ManifestTemplate::Library => format!(
            r#"[package]
name = "{name}"
tools-version = "5.2"
language-versions = ["5"]

[[products]]
name = "{name}"
kind = "library"
targets = ["{name}"]

[[targets]]
name = "{name}"

[[targets]]
name = "{name}Tests"
kind = "test"
dependencies = ["{name}"]
"#
        ),
        ManifestTemplate::Executable => format!(
            r#"[package]
name = "{name}"
tools-version = "5.2"
language-versions = ["5"]

[[products]]
name = "{name}"
kind = "executable"
targets = ["{name}"]

[[targets]]
name = "{name}"
kind = "executable"
"#
        ),
        ManifestTemplate::Tool => {
            let exe = name.to_lowercase();
            format!(
                r#"[package]
name = "{name}"
tools-version = "5.2"
language-versions = ["5"]

[platforms]
macos = "10.15"

[[products]]
name = "{exe}"
kind = "executable"
targets = ["{exe}"]

[[products]]
name = "{name}Kit"
kind = "library"
linkage = "dynamic"
targets = ["{name}Kit"]

[[dependencies]]
url = "https://github.com/apple/swift-argument-parser"
from = "0.0.1"

[[dependencies]]
url = "https://github.com/Quick/Quick"
from = "2.2.0"

[[dependencies]]
url = "https://github.com/Quick/Nimble"
from = "8.0.9"

[[targets]]
name = "{exe}"
kind = "executable"
dependencies = ["{name}Kit"]

[[targets]]
name = "{name}Kit"
dependencies = [{{ product = "ArgumentParser", package = "swift-argument-parser" }}]

[[targets]]
name = "{name}KitTests"
kind = "test"
dependencies = ["{name}Kit", "Quick", "Nimble"]
"#
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::Requirement;
    use crate::test_support::fixtures;
    use semver::Version;
    use tempfile::TempDir;

    #[test]
    fn test_parse_original_layout() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);

        let manifest = Manifest::parse(fixtures::SWIFTCLI_MANIFEST, &path).unwrap();
        assert_eq!(manifest.name, "SwiftCLI");
        assert_eq!(manifest.tools_version.as_deref(), Some("5.2"));
        assert_eq!(manifest.language_versions, vec!["5"]);
        assert_eq!(manifest.platforms, vec![Platform::new(PlatformFamily::Macos, "10.15")]);
        assert_eq!(manifest.products.len(), 2);
        assert_eq!(manifest.dependencies.len(), 3);
        assert_eq!(manifest.targets.len(), 3);

        let kit = manifest.product("SwiftCLIKit").unwrap();
        assert_eq!(kit.linkage, Linkage::Dynamic);

        let parser = manifest.dependency("swift-argument-parser").unwrap();
        assert_eq!(
            parser.requirement(),
            &Requirement::UpToNextMajor(Version::new(0, 0, 1))
        );
    }

    #[test]
    fn test_parse_target_dependency_forms() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        let manifest = Manifest::parse(fixtures::SWIFTCLI_MANIFEST, &path).unwrap();

        let kit = manifest.target("SwiftCLIKit").unwrap();
        assert_eq!(
            kit.dependencies,
            vec![TargetDependency::product("ArgumentParser", "swift-argument-parser")]
        );

        let tests = manifest.target("SwiftCLIKitTests").unwrap();
        assert!(tests.is_test());
        assert_eq!(tests.dependencies.len(), 3);
    }

    #[test]
    fn test_resolve_by_name_prefers_target() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        let manifest = Manifest::parse(fixtures::SWIFTCLI_MANIFEST, &path).unwrap();

        let kit = TargetDependency::by_name("SwiftCLIKit");
        assert!(matches!(
            manifest.resolve_target_dependency(&kit),
            ResolvedTargetDependency::Target(t) if t.name == "SwiftCLIKit"
        ));

        let quick = TargetDependency::by_name("Quick");
        assert!(matches!(
            manifest.resolve_target_dependency(&quick),
            ResolvedTargetDependency::Product { product: "Quick", package } if package.identity() == "quick"
        ));

        let missing = TargetDependency::by_name("Missing");
        assert_eq!(
            manifest.resolve_target_dependency(&missing),
            ResolvedTargetDependency::Unknown
        );
    }

    #[test]
    fn test_parse_error_has_span() {
        let content = "[package]\nname = \"x\"\n\n[[products]]\nname = \"x\"\nkind = \"framework\"\n";
        let err = Manifest::parse(content, Path::new("Package.toml")).unwrap_err();
        let parse_err = err.downcast_ref::<ManifestParseError>().unwrap();
        assert!(parse_err.span.is_some());
    }

    #[test]
    fn test_missing_package_section() {
        let err = Manifest::parse("[[targets]]\nname = \"x\"\n", Path::new("Package.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to parse manifest"));
    }

    #[test]
    fn test_unknown_platform() {
        let content = "[package]\nname = \"x\"\n\n[platforms]\namiga = \"3.1\"\n";
        let err = Manifest::parse(content, Path::new("Package.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("unknown platform `amiga`"));
    }

    #[test]
    fn test_invalid_dependency_entry() {
        let content = "[package]\nname = \"x\"\n\n[[dependencies]]\nurl = \"https://github.com/Quick/Quick\"\n";
        let err = Manifest::parse(content, Path::new("Package.toml")).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("[[dependencies]] entry #1"));
        assert!(msg.contains("needs a version requirement"));
    }

    #[test]
    fn test_generated_templates_parse() {
        for template in [
            ManifestTemplate::Library,
            ManifestTemplate::Executable,
            ManifestTemplate::Tool,
        ] {
            let content = generate_manifest("Demo", template);
            let manifest = Manifest::parse(&content, Path::new("Package.toml")).unwrap();
            assert_eq!(manifest.name, "Demo");

            let declared: Vec<_> = manifest
                .targets
                .iter()
                .map(|t| (t.name.clone(), t.kind))
                .collect();
            assert_eq!(declared, template.targets("Demo"));
        }
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest, "[package]\nname = \"x\"\n").unwrap();
        let nested = tmp.path().join("Sources").join("x");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest(&nested), Some(manifest));
    }
}
