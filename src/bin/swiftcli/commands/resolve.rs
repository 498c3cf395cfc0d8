//! `swiftcli resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use crate::commands::{load_index, load_manifest};
use crate::GlobalOptions;
use swiftcli_kit::ops::resolve::{resolve_package, PinChange, ResolveOptions, ResolveStatus};
use swiftcli_kit::util::shell::{Shell, Status};

pub fn execute(args: ResolveArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let manifest = load_manifest(opts)?;
    let index = load_index(args.index.as_deref(), opts)?;

    let resolve_opts = ResolveOptions {
        locked: args.locked || opts.ctx.config().resolve.locked,
        force: args.force,
        ..Default::default()
    };

    let spinner = shell.spinner(
        Status::Resolving,
        format!("dependencies of `{}`", manifest.name),
    );
    let outcome = resolve_package(&manifest, &index, &resolve_opts)?;

    report_changes(shell, &outcome.changes);

    match outcome.status {
        ResolveStatus::UpToDate => {
            drop(spinner);
            shell.status(Status::Locked, "Package.resolved is up to date");
        }
        _ => spinner.finish(shell, format!("resolving {} packages", outcome.resolve.len())),
    }

    Ok(())
}

/// Print one status line per changed pin.
pub fn report_changes(shell: &Shell, changes: &[PinChange]) {
    for change in changes {
        match (&change.old, &change.new) {
            (None, Some(new)) => shell.status(Status::Added, format!("{} {}", change.identity, new)),
            (Some(old), Some(new)) => shell.status(
                Status::Updated,
                format!("{} {} -> {}", change.identity, old, new),
            ),
            (Some(old), None) => {
                shell.status(Status::Removed, format!("{} {}", change.identity, old))
            }
            (None, None) => {}
        }
    }
}
