//! `swiftcli check` command

use anyhow::{bail, Result};

use crate::cli::{CheckArgs, OutputFormat};
use crate::commands::load_manifest;
use crate::GlobalOptions;
use swiftcli_kit::ops::check::{check_with, CheckOptions};
use swiftcli_kit::ops::lockfile::needs_update;
use swiftcli_kit::util::diagnostic::{emit, suggestions};
use swiftcli_kit::util::shell::Status;

pub fn execute(args: CheckArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let manifest = load_manifest(opts)?;

    shell.status(Status::Checking, format!("`{}`", manifest.name));

    let check_opts = CheckOptions {
        check_sources: !args.no_sources,
    };
    let report = check_with(&manifest, &check_opts);

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json(&manifest.name)?),
        OutputFormat::Text => {
            for diagnostic in &report.diagnostics {
                if diagnostic.is_error() || !shell.is_quiet() {
                    emit(diagnostic, shell.use_color());
                }
            }
        }
    }

    let lockfile_path = manifest.lockfile_path();
    if lockfile_path.exists() && needs_update(&manifest, &lockfile_path)? {
        shell.warn(format!(
            "Package.resolved is out of date\n{}",
            suggestions::STALE_LOCK
        ));
    }

    if report.fails(args.deny_warnings) {
        bail!(
            "could not validate `{}` ({})",
            manifest.name,
            report.summary()
        );
    }

    shell.status(
        Status::Finished,
        format!("`{}`: {}", manifest.name, report.summary()),
    );
    Ok(())
}
