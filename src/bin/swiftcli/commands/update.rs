//! `swiftcli update` command

use anyhow::Result;

use crate::cli::UpdateArgs;
use crate::commands::resolve::report_changes;
use crate::commands::{load_index, load_manifest};
use crate::GlobalOptions;
use swiftcli_kit::ops::resolve::{resolve_package, ResolveOptions};
use swiftcli_kit::util::shell::Status;

pub fn execute(args: UpdateArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let manifest = load_manifest(opts)?;
    let index = load_index(args.index.as_deref(), opts)?;

    let resolve_opts = ResolveOptions {
        update: Some(args.packages),
        write: !args.dry_run,
        ..Default::default()
    };

    let spinner = shell.spinner(
        Status::Resolving,
        format!("dependencies of `{}`", manifest.name),
    );
    let outcome = resolve_package(&manifest, &index, &resolve_opts)?;
    drop(spinner);

    report_changes(shell, &outcome.changes);

    if outcome.changes.is_empty() {
        shell.note("all packages are already at their newest allowed versions");
    } else if args.dry_run {
        shell.note(format!(
            "would update {} packages (dry run, Package.resolved not written)",
            outcome.changes.len()
        ));
    }

    Ok(())
}
