//! `swiftcli init` command

use anyhow::Result;

use crate::cli::InitArgs;
use crate::GlobalOptions;
use swiftcli_kit::ops::init::{init_package, InitOptions};
use swiftcli_kit::util::shell::Status;

pub fn execute(args: InitArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;

    let dir = match &args.path {
        Some(path) => opts.ctx.cwd().join(path),
        None => opts.ctx.cwd().to_path_buf(),
    };

    let init_opts = InitOptions {
        name: args.name,
        template: args.template.into(),
    };

    let result = init_package(&dir, &init_opts)?;

    shell.status(
        Status::Created,
        format!("package `{}` at {}", result.name, dir.display()),
    );
    for source_dir in &result.source_dirs {
        shell.status(Status::Created, source_dir.display());
    }

    Ok(())
}
