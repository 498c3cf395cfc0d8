//! swiftcli CLI - manifest tooling for Swift-style packages

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

use swiftcli_kit::core::manifest::ManifestParseError;
use swiftcli_kit::resolver::ResolveError;
use swiftcli_kit::util::diagnostic;
use swiftcli_kit::util::shell::ColorChoice;
use swiftcli_kit::util::{GlobalContext, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// State shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub ctx: GlobalContext,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("swiftcli=debug,swiftcli_kit=debug")
        } else if cli.quiet {
            EnvFilter::new("swiftcli=warn,swiftcli_kit=warn")
        } else {
            EnvFilter::new("swiftcli=info,swiftcli_kit=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = cli.color.unwrap_or_default();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: ColorChoice) -> Result<()> {
    let ctx = GlobalContext::new()?.with_manifest_path(cli.manifest_path.clone());

    // an explicit --color wins over the config file
    let color = match (cli.color.is_some(), ctx.config().term.color) {
        (false, Some(configured)) => configured.parse().unwrap_or(color),
        _ => color,
    };

    let opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, color),
        ctx,
    };

    // Execute command
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &opts),
        Commands::Check(args) => commands::check::execute(args, &opts),
        Commands::Describe(args) => commands::describe::execute(args, &opts),
        Commands::Tree(args) => commands::tree::execute(args, &opts),
        Commands::Resolve(args) => commands::resolve::execute(args, &opts),
        Commands::Update(args) => commands::update::execute(args, &opts),
        Commands::AddDependency(args) => commands::add::execute(args, &opts),
        Commands::RemoveDependency(args) => commands::remove::execute(args, &opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Print an error, rendering typed errors with their diagnostics.
fn report(err: &anyhow::Error, color: ColorChoice) {
    if let Some(parse_error) = err.downcast_ref::<ManifestParseError>() {
        let handler = match color {
            ColorChoice::Never => GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor()),
            _ => GraphicalReportHandler::new(),
        };
        let mut rendered = String::new();
        if handler.render_report(&mut rendered, parse_error).is_ok() {
            eprint!("{}", rendered);
            return;
        }
    }

    if let Some(resolve_error) = err.downcast_ref::<ResolveError>() {
        let use_color = Shell::new(Default::default(), color).use_color();
        diagnostic::emit(&resolve_error.to_diagnostic(), use_color);
        return;
    }

    eprintln!("error: {:#}", err);
}
