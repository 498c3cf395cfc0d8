//! `swiftcli describe` command

use anyhow::Result;

use crate::cli::{DescribeArgs, OutputFormat};
use crate::commands::load_manifest;
use crate::GlobalOptions;
use swiftcli_kit::ops::describe::{describe, to_json, to_text};

pub fn execute(args: DescribeArgs, opts: &GlobalOptions) -> Result<()> {
    let manifest = load_manifest(opts)?;

    match args.format {
        OutputFormat::Text => print!("{}", to_text(&manifest)),
        OutputFormat::Json => println!("{}", to_json(&describe(&manifest))?),
    }

    Ok(())
}
