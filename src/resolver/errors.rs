//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during dependency resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no matching version for `{package}`")]
    NoMatchingVersion {
        package: String,
        requirement: String,
        available: Vec<String>,
    },

    #[error("package not found: `{package}`")]
    PackageNotFound {
        package: String,
        suggestions: Vec<String>,
    },

    #[error("dependency requirements cannot be satisfied")]
    Unsatisfiable { report: String },

    #[error("package `{package}` is required from different locations")]
    ConflictingLocations {
        package: String,
        locations: Vec<String>,
    },

    #[error("package `{package}` is declared more than once")]
    DuplicateDependency {
        package: String,
        requirements: Vec<String>,
    },

    #[error("locked package `{package}` is missing from the index")]
    StalePin { package: String, version: String },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::NoMatchingVersion {
                package,
                requirement,
                available,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "no version of `{}` matches requirement `{}`",
                    package, requirement
                ))
                .with_code("no-matching-version");

                if available.is_empty() {
                    diag = diag.with_context("the index lists no versions".to_string());
                } else {
                    diag = diag.with_context(format!(
                        "available versions: {}",
                        available.join(", ")
                    ));
                }

                diag.with_suggestion(format!(
                    "Update your version requirement for `{}`",
                    package
                ))
            }

            ResolveError::PackageNotFound {
                package,
                suggestions: similar,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "could not find package `{}` in the package index",
                    package
                ))
                .with_code("package-not-found");

                if !similar.is_empty() {
                    diag = diag.with_context(format!(
                        "did you mean: {}?",
                        similar.join(", ")
                    ));
                }

                diag.with_suggestion("Check that the dependency URL is spelled correctly")
                    .with_suggestion(suggestions::NO_INDEX.trim_start_matches("help: "))
            }

            ResolveError::Unsatisfiable { report } => {
                let mut diag = Diagnostic::error("dependency requirements cannot be satisfied")
                    .with_code("unsatisfiable");

                for line in report.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }

                diag.with_suggestion("Relax the version requirements of the conflicting packages")
            }

            ResolveError::ConflictingLocations { package, locations } => {
                let mut diag = Diagnostic::error(format!(
                    "package `{}` is required from different locations",
                    package
                ))
                .with_code("conflicting-locations");

                for location in locations {
                    diag = diag.with_context(format!("required from {}", location));
                }

                diag.with_suggestion("Point every dependency on the package at the same URL")
            }

            ResolveError::DuplicateDependency {
                package,
                requirements,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "package `{}` is declared more than once",
                    package
                ))
                .with_code("duplicate-dependency");

                for requirement in requirements {
                    diag = diag.with_context(format!("declared as {}", requirement));
                }

                diag.with_suggestion("Keep a single dependency entry for the package")
            }

            ResolveError::StalePin { package, version } => Diagnostic::error(format!(
                "locked version {} of `{}` is not in the package index",
                version, package
            ))
            .with_code("stale-pin")
            .with_suggestion("Run `swiftcli update` to pick a new version"),
        }
    }
}
