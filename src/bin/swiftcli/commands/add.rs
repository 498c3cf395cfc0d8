//! `swiftcli add-dependency` command

use anyhow::Result;

use crate::cli::AddDependencyArgs;
use crate::GlobalOptions;
use swiftcli_kit::ops::edit::add_dependency;
use swiftcli_kit::util::shell::Status;

pub fn execute(args: AddDependencyArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let manifest_path = opts.ctx.find_manifest()?;

    let result = add_dependency(&manifest_path, &args.to_spec())?;

    shell.status(
        Status::Added,
        format!("{} ({})", result.identity, result.requirement),
    );
    shell.note(format!(
        "run `swiftcli resolve` to pin `{}`",
        result.identity
    ));

    Ok(())
}
