//! `swiftcli remove-dependency` command

use anyhow::Result;

use crate::cli::RemoveDependencyArgs;
use crate::GlobalOptions;
use swiftcli_kit::ops::edit::remove_dependency;
use swiftcli_kit::util::shell::Status;

pub fn execute(args: RemoveDependencyArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let manifest_path = opts.ctx.find_manifest()?;

    let result = remove_dependency(&manifest_path, &args.package)?;

    shell.status(Status::Removed, &result.identity);
    for target in &result.dangling {
        shell.warn(format!(
            "target `{}` still depends on a product of `{}`",
            target, result.identity
        ));
    }

    Ok(())
}
