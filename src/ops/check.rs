//! Structural validation of a manifest.
//!
//! `check` runs every rule and collects all findings instead of stopping at
//! the first one. Findings are [`Diagnostic`]s with a stable code:
//!
//! - errors break an invariant of the package model (unique names, product
//!   targets that exist, an acyclic target graph, ...)
//! - warnings flag layouts that are legal but probably unintended
//!   (unused dependencies, test targets without a subject, ...)

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{Manifest, ResolvedTargetDependency, Target, TargetDependency, TargetGraph};
use crate::resolver::version::parse_version_lenient;
use crate::util::diagnostic::{Diagnostic, Severity};

/// Options for a check run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Look for each target's source directory on disk
    pub check_sources: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            check_sources: true,
        }
    }
}

/// All findings of a check run, in rule order.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether the run should fail, optionally treating warnings as errors.
    pub fn fails(&self, deny_warnings: bool) -> bool {
        self.has_errors() || (deny_warnings && self.warnings().next().is_some())
    }

    /// Codes of all findings, for tests and summaries.
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.iter().filter_map(|d| d.code).collect()
    }

    /// `2 errors, 1 warning`
    pub fn summary(&self) -> String {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        format!(
            "{} {}, {} {}",
            errors,
            if errors == 1 { "error" } else { "errors" },
            warnings,
            if warnings == 1 { "warning" } else { "warnings" }
        )
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    package: &'a str,
    errors: usize,
    warnings: usize,
    diagnostics: &'a [Diagnostic],
}

impl CheckReport {
    /// Render the findings for `package` as pretty-printed JSON.
    pub fn to_json(&self, package: &str) -> Result<String> {
        let report = JsonReport {
            package,
            errors: self.errors().count(),
            warnings: self.warnings().count(),
            diagnostics: &self.diagnostics,
        };
        serde_json::to_string_pretty(&report).context("failed to serialize check report")
    }
}

/// Validate a manifest with default options.
pub fn check(manifest: &Manifest) -> CheckReport {
    check_with(manifest, &CheckOptions::default())
}

/// Validate a manifest.
pub fn check_with(manifest: &Manifest, opts: &CheckOptions) -> CheckReport {
    let mut report = CheckReport::default();

    check_package(manifest, &mut report);
    check_platforms(manifest, &mut report);
    check_duplicates(manifest, &mut report);
    check_products(manifest, &mut report);
    check_dependencies(manifest, &mut report);
    check_target_dependencies(manifest, &mut report);
    check_cycles(manifest, &mut report);

    check_test_targets(manifest, &mut report);
    check_unused_dependencies(manifest, &mut report);
    check_unreachable_targets(manifest, &mut report);
    if opts.check_sources {
        check_sources(manifest, &mut report);
    }

    tracing::debug!("checked {}: {}", manifest.name, report.summary());
    report
}

fn check_package(manifest: &Manifest, report: &mut CheckReport) {
    if manifest.name.trim().is_empty() {
        report.push(
            Diagnostic::error("package name is empty")
                .with_code("empty-name")
                .with_suggestion("Set `name` in the [package] table"),
        );
    }

    if let Some(tools) = &manifest.tools_version {
        if parse_version_lenient(tools).is_none() {
            report.push(
                Diagnostic::error(format!("invalid tools version `{}`", tools))
                    .with_code("invalid-tools-version")
                    .with_context("expected a version such as `5.2`"),
            );
        }
    }
}

fn check_platforms(manifest: &Manifest, report: &mut CheckReport) {
    let mut seen = HashSet::new();

    for platform in &manifest.platforms {
        if !seen.insert(platform.family) {
            report.push(
                Diagnostic::error(format!(
                    "platform `{}` is declared more than once",
                    platform.family
                ))
                .with_code("duplicate-platform"),
            );
        }

        if let Err(e) = platform.parsed_version() {
            report.push(
                Diagnostic::error(format!(
                    "invalid minimum version for {}: {}",
                    platform.family.display_name(),
                    e
                ))
                .with_code("invalid-platform-version")
                .with_context("expected a dotted numeric version such as `10.15`"),
            );
        }
    }
}

fn check_duplicates(manifest: &Manifest, report: &mut CheckReport) {
    for name in duplicates(manifest.targets.iter().map(|t| t.name.clone())) {
        report.push(
            Diagnostic::error(format!("target `{}` is declared more than once", name))
                .with_code("duplicate-target"),
        );
    }

    for name in duplicates(manifest.products.iter().map(|p| p.name.clone())) {
        report.push(
            Diagnostic::error(format!("product `{}` is declared more than once", name))
                .with_code("duplicate-product"),
        );
    }

    for identity in duplicates(manifest.dependencies.iter().map(|d| d.identity())) {
        report.push(
            Diagnostic::error(format!("package `{}` is declared more than once", identity))
                .with_code("duplicate-dependency")
                .with_context("dependency identities come from the last URL or path component"),
        );
    }
}

/// Values occurring more than once, each reported once, in first-seen order.
fn duplicates(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();

    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(value);
        }
    }

    order
}

fn check_products(manifest: &Manifest, report: &mut CheckReport) {
    for product in &manifest.products {
        if product.targets.is_empty() {
            report.push(
                Diagnostic::error(format!("product `{}` has no targets", product.name))
                    .with_code("empty-product")
                    .with_suggestion("List at least one target in `targets`"),
            );
        }

        for name in &product.targets {
            match manifest.target(name) {
                None => {
                    let mut diag = Diagnostic::error(format!(
                        "product `{}` references undeclared target `{}`",
                        product.name, name
                    ))
                    .with_code("unknown-product-target");
                    if let Some(close) = closest_target(manifest, name) {
                        diag = diag.with_suggestion(format!("Did you mean `{}`?", close));
                    }
                    report.push(diag);
                }
                Some(target) if target.is_test() => report.push(
                    Diagnostic::error(format!(
                        "product `{}` vends test target `{}`",
                        product.name, name
                    ))
                    .with_code("test-target-in-product"),
                ),
                Some(_) => {}
            }
        }
    }
}

fn closest_target<'a>(manifest: &'a Manifest, name: &str) -> Option<&'a str> {
    manifest
        .targets
        .iter()
        .map(|t| t.name.as_str())
        .find(|t| t.eq_ignore_ascii_case(name))
}

fn check_dependencies(manifest: &Manifest, report: &mut CheckReport) {
    for dep in &manifest.dependencies {
        if dep.requirement().is_empty_range() {
            report.push(
                Diagnostic::error(format!(
                    "requirement `{}` of `{}` admits no version",
                    dep.requirement(),
                    dep.display_name()
                ))
                .with_code("invalid-requirement")
                .with_context("a range's lower bound must be below its upper bound"),
            );
        }
    }
}

fn check_target_dependencies(manifest: &Manifest, report: &mut CheckReport) {
    for target in &manifest.targets {
        for dep in &target.dependencies {
            match manifest.resolve_target_dependency(dep) {
                ResolvedTargetDependency::Unknown => report.push(unknown_dependency(target, dep)),
                ResolvedTargetDependency::Target(used) if used.is_test() && !target.is_test() => {
                    report.push(
                        Diagnostic::error(format!(
                            "target `{}` depends on test target `{}`",
                            target.name, used.name
                        ))
                        .with_code("depends-on-test-target"),
                    )
                }
                _ => {}
            }
        }
    }
}

fn unknown_dependency(target: &Target, dep: &TargetDependency) -> Diagnostic {
    match dep {
        TargetDependency::Product { name, package } => Diagnostic::error(format!(
            "target `{}` uses product `{}` of undeclared package `{}`",
            target.name, name, package
        ))
        .with_code("unknown-package")
        .with_suggestion(format!(
            "Declare it with `swiftcli add-dependency <url> --name {}`",
            package
        )),
        TargetDependency::Target { name } | TargetDependency::ByName { name } => {
            Diagnostic::error(format!(
                "target `{}` depends on unknown target or package `{}`",
                target.name, name
            ))
            .with_code("unknown-dependency")
            .with_context("names resolve to a target first, then to a package identity")
        }
    }
}

fn check_cycles(manifest: &Manifest, report: &mut CheckReport) {
    if let Some(cycle) = TargetGraph::from_manifest(manifest).find_cycle() {
        report.push(
            Diagnostic::error("cycle in target dependencies")
                .with_code("dependency-cycle")
                .with_context(cycle.join(" -> "))
                .with_suggestion("Move the shared code into a target both can depend on"),
        );
    }
}

fn check_test_targets(manifest: &Manifest, report: &mut CheckReport) {
    for target in manifest.test_targets() {
        let resolved: Vec<_> = target
            .dependencies
            .iter()
            .map(|dep| manifest.resolve_target_dependency(dep))
            .collect();

        let has_subject = resolved
            .iter()
            .any(|r| matches!(r, ResolvedTargetDependency::Target(t) if !t.is_test()));
        if !has_subject {
            report.push(
                Diagnostic::warning(format!(
                    "test target `{}` does not depend on the code it tests",
                    target.name
                ))
                .with_code("test-without-subject"),
            );
        }

        let has_support = resolved
            .iter()
            .any(|r| matches!(r, ResolvedTargetDependency::Product { .. }));
        if !has_support && !manifest.dependencies.is_empty() {
            report.push(
                Diagnostic::warning(format!(
                    "test target `{}` uses none of the declared packages",
                    target.name
                ))
                .with_code("missing-test-support")
                .with_context("test frameworks are usually declared as package dependencies"),
            );
        }
    }
}

fn check_unused_dependencies(manifest: &Manifest, report: &mut CheckReport) {
    let used: HashSet<String> = manifest
        .targets
        .iter()
        .flat_map(|t| t.dependencies.iter())
        .filter_map(|dep| match manifest.resolve_target_dependency(dep) {
            ResolvedTargetDependency::Product { package, .. } => Some(package.identity()),
            _ => None,
        })
        .collect();

    for dep in &manifest.dependencies {
        if !used.contains(&dep.identity()) {
            report.push(
                Diagnostic::warning(format!(
                    "package `{}` is not used by any target",
                    dep.display_name()
                ))
                .with_code("unused-dependency")
                .with_suggestion(format!(
                    "Remove it with `swiftcli remove-dependency {}`",
                    dep.identity()
                )),
            );
        }
    }
}

fn check_unreachable_targets(manifest: &Manifest, report: &mut CheckReport) {
    let vended: HashSet<&str> = manifest
        .products
        .iter()
        .flat_map(|p| p.targets.iter().map(String::as_str))
        .collect();
    let graph = TargetGraph::from_manifest(manifest);

    for target in manifest.targets.iter().filter(|t| !t.is_test()) {
        if vended.contains(target.name.as_str()) || !graph.dependents(&target.name).is_empty() {
            continue;
        }
        report.push(
            Diagnostic::warning(format!(
                "target `{}` is not part of any product or target",
                target.name
            ))
            .with_code("unreachable-target"),
        );
    }
}

fn check_sources(manifest: &Manifest, report: &mut CheckReport) {
    for target in &manifest.targets {
        let dir = target.source_dir();
        if !manifest.manifest_dir.join(&dir).is_dir() {
            report.push(
                Diagnostic::warning(format!(
                    "source directory `{}` of target `{}` does not exist",
                    dir.display(),
                    target.name
                ))
                .with_code("missing-sources"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, PackageFixture};

    fn check_str(content: &str) -> CheckReport {
        let opts = CheckOptions {
            check_sources: false,
        };
        check_with(&fixtures::manifest(content), &opts)
    }

    #[test]
    fn test_reference_package_is_clean() {
        let report = check_str(fixtures::SWIFTCLI_MANIFEST);
        assert!(report.is_clean(), "{:?}", report.codes());
        assert_eq!(report.summary(), "0 errors, 0 warnings");
    }

    #[test]
    fn test_json_report() {
        let report = check_str(fixtures::CYCLIC_MANIFEST);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json("Ring").unwrap()).unwrap();

        assert_eq!(json["package"], "Ring");
        assert_eq!(json["errors"], report.errors().count());
        let cycle = json["diagnostics"]
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["code"] == "dependency-cycle")
            .unwrap();
        assert_eq!(cycle["severity"], "error");
        assert_eq!(cycle["context"][0], "A -> B -> C -> A");
        assert!(cycle.get("location").is_none());
    }

    #[test]
    fn test_cycle_is_reported_in_order() {
        let report = check_str(fixtures::CYCLIC_MANIFEST);

        assert!(report.has_errors());
        let cycle = report
            .diagnostics
            .iter()
            .find(|d| d.code == Some("dependency-cycle"))
            .unwrap();
        assert_eq!(cycle.context, vec!["A -> B -> C -> A"]);
    }

    #[test]
    fn test_product_rules() {
        let report = check_str(
            r#"
[package]
name = "App"

[[products]]
name = "Empty"
kind = "library"

[[products]]
name = "App"
kind = "executable"
targets = ["app", "AppTests"]

[[targets]]
name = "App"
kind = "executable"

[[targets]]
name = "AppTests"
kind = "test"
dependencies = ["App"]
"#,
        );

        assert_eq!(
            report.codes(),
            vec!["empty-product", "unknown-product-target", "test-target-in-product"]
        );
        let unknown = &report.diagnostics[1];
        assert_eq!(unknown.suggestions, vec!["Did you mean `App`?"]);
    }

    #[test]
    fn test_duplicates() {
        let report = check_str(
            r#"
[package]
name = "App"

[platforms]
macos = "10.15"
osx = "11"

[[products]]
name = "App"
kind = "library"
targets = ["App"]

[[products]]
name = "App"
kind = "library"
targets = ["App"]

[[dependencies]]
url = "https://github.com/Quick/Nimble"
from = "8.0.0"

[[dependencies]]
url = "https://example.com/mirror/nimble.git"
from = "8.0.0"

[[targets]]
name = "App"
dependencies = ["Nimble"]

[[targets]]
name = "App"
"#,
        );

        let codes = report.codes();
        assert!(codes.contains(&"duplicate-platform"));
        assert!(codes.contains(&"duplicate-target"));
        assert!(codes.contains(&"duplicate-product"));
        assert!(codes.contains(&"duplicate-dependency"));
    }

    #[test]
    fn test_target_dependency_rules() {
        let report = check_str(
            r#"
[package]
name = "App"

[[products]]
name = "App"
kind = "library"
targets = ["App"]

[[targets]]
name = "App"
dependencies = [
    "Missing",
    { product = "Logging", package = "swift-log" },
    { target = "AppTests" },
]

[[targets]]
name = "AppTests"
kind = "test"
dependencies = ["App"]
"#,
        );

        assert_eq!(
            report.codes(),
            vec![
                "unknown-dependency",
                "unknown-package",
                "depends-on-test-target",
                "dependency-cycle",
            ]
        );
    }

    #[test]
    fn test_invalid_versions() {
        let report = check_str(
            r#"
[package]
name = " "
tools-version = "five"

[platforms]
ios = "thirteen"

[[dependencies]]
url = "https://github.com/Quick/Quick"
range = { lower = "3.0.0", upper = "2.0.0" }
"#,
        );

        let codes = report.codes();
        assert!(codes.contains(&"empty-name"));
        assert!(codes.contains(&"invalid-tools-version"));
        assert!(codes.contains(&"invalid-platform-version"));
        assert!(codes.contains(&"invalid-requirement"));
    }

    #[test]
    fn test_warnings() {
        let report = check_str(
            r#"
[package]
name = "App"

[[products]]
name = "App"
kind = "library"
targets = ["App"]

[[dependencies]]
url = "https://github.com/Quick/Quick"
from = "2.2.0"

[[targets]]
name = "App"

[[targets]]
name = "Orphan"

[[targets]]
name = "AppTests"
kind = "test"
"#,
        );

        assert!(!report.has_errors());
        assert_eq!(
            report.codes(),
            vec![
                "test-without-subject",
                "missing-test-support",
                "unused-dependency",
                "unreachable-target",
            ]
        );
        assert!(!report.fails(false));
        assert!(report.fails(true));
    }

    #[test]
    fn test_missing_sources() {
        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST);
        let report = check(&fixture.manifest());
        assert_eq!(report.warnings().count(), 3);
        assert!(report.warnings().all(|d| d.code == Some("missing-sources")));

        let fixture = PackageFixture::new(fixtures::SWIFTCLI_MANIFEST).with_sources();
        assert!(check(&fixture.manifest()).is_clean());
    }
}
