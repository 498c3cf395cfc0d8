//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use swiftcli_kit::core::dependency::RangeSpec;
use swiftcli_kit::core::{DependencySpec, ManifestTemplate};
use swiftcli_kit::util::shell::ColorChoice;

/// swiftcli - validate, describe and resolve Swift-style package manifests
#[derive(Parser)]
#[command(name = "swiftcli")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring
    #[arg(long, global = true, value_enum, value_name = "WHEN")]
    pub color: Option<ColorChoice>,

    /// Path to Package.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a Package.toml and source directories in a directory
    Init(InitArgs),

    /// Validate the manifest
    Check(CheckArgs),

    /// Print the manifest contents
    Describe(DescribeArgs),

    /// Display the target or package dependency tree
    Tree(TreeArgs),

    /// Resolve dependencies and write Package.resolved
    Resolve(ResolveArgs),

    /// Re-resolve dependencies, dropping existing pins
    Update(UpdateArgs),

    /// Add a package dependency to Package.toml
    AddDependency(AddDependencyArgs),

    /// Remove a package dependency from Package.toml
    RemoveDependency(RemoveDependencyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TemplateArg {
    #[default]
    Library,
    Executable,
    /// Executable, library and test target
    Tool,
}

impl From<TemplateArg> for ManifestTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Library => ManifestTemplate::Library,
            TemplateArg::Executable => ManifestTemplate::Executable,
            TemplateArg::Tool => ManifestTemplate::Tool,
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Package name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Package layout
    #[arg(long = "type", value_enum, default_value_t = TemplateArg::Library)]
    pub template: TemplateArg,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,

    /// Skip looking for target source directories
    #[arg(long)]
    pub no_sources: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct DescribeArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TreeFormat {
    #[default]
    Text,
    /// Graphviz
    Dot,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only show the tree of this target
    pub target: Option<String>,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = TreeFormat::Text)]
    pub format: TreeFormat,

    /// Show resolved packages instead of targets
    #[arg(long, conflicts_with = "target")]
    pub packages: bool,

    /// Package index file
    #[arg(long, env = "SWIFTCLI_INDEX", value_name = "FILE")]
    pub index: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Package index file
    #[arg(long, env = "SWIFTCLI_INDEX", value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Fail if Package.resolved needs to change
    #[arg(long)]
    pub locked: bool,

    /// Resolve even if Package.resolved is up to date
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Packages to update (all if omitted)
    pub packages: Vec<String>,

    /// Package index file
    #[arg(long, env = "SWIFTCLI_INDEX", value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Show what would change without writing Package.resolved
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct AddDependencyArgs {
    /// Repository URL
    #[arg(required_unless_present = "path", conflicts_with = "path")]
    pub url: Option<String>,

    /// Local package directory
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Explicit package name
    #[arg(long)]
    pub name: Option<String>,

    /// Up to the next major version from this one
    #[arg(long, value_name = "VERSION", group = "requirement")]
    pub from: Option<String>,

    /// Up to the next minor version from this one
    #[arg(long, value_name = "VERSION", group = "requirement")]
    pub up_to_next_minor: Option<String>,

    /// Exactly this version
    #[arg(long, value_name = "VERSION", group = "requirement")]
    pub exact: Option<String>,

    /// Half-open version range, e.g. 1.0.0..2.0.0
    #[arg(long, value_name = "LOWER..UPPER", value_parser = parse_range, group = "requirement")]
    pub range: Option<RangeSpec>,

    /// Track a branch
    #[arg(long, group = "requirement")]
    pub branch: Option<String>,

    /// Pin a commit
    #[arg(long, group = "requirement")]
    pub revision: Option<String>,
}

impl AddDependencyArgs {
    pub fn to_spec(&self) -> DependencySpec {
        DependencySpec {
            url: self.url.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
            from: self.from.clone(),
            up_to_next_minor: self.up_to_next_minor.clone(),
            exact: self.exact.clone(),
            range: self.range.clone(),
            branch: self.branch.clone(),
            revision: self.revision.clone(),
        }
    }
}

fn parse_range(s: &str) -> Result<RangeSpec, String> {
    let (lower, upper) = s
        .split_once("..<")
        .or_else(|| s.split_once(".."))
        .ok_or_else(|| format!("expected LOWER..UPPER, got `{}`", s))?;

    if lower.is_empty() || upper.is_empty() {
        return Err(format!("expected LOWER..UPPER, got `{}`", s));
    }

    Ok(RangeSpec {
        lower: lower.to_string(),
        upper: upper.to_string(),
    })
}

#[derive(Args)]
pub struct RemoveDependencyArgs {
    /// Package identity, name or URL
    pub package: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
