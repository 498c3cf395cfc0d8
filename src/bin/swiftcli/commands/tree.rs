//! `swiftcli tree` command

use anyhow::{bail, Result};

use crate::cli::{TreeArgs, TreeFormat};
use crate::commands::{load_index, load_manifest};
use crate::GlobalOptions;
use swiftcli_kit::core::TargetGraph;
use swiftcli_kit::ops::resolve::{resolve_package, ResolveOptions};
use swiftcli_kit::ops::tree::{package_tree, target_tree, TreeOptions};

pub fn execute(args: TreeArgs, opts: &GlobalOptions) -> Result<()> {
    let manifest = load_manifest(opts)?;

    if args.packages {
        if args.format == TreeFormat::Dot {
            bail!("`--format dot` is only supported for the target graph");
        }

        // Package.resolved has no edges, so resolve in memory
        let index = load_index(args.index.as_deref(), opts)?;
        let resolve_opts = ResolveOptions {
            force: true,
            write: false,
            ..Default::default()
        };
        let outcome = resolve_package(&manifest, &index, &resolve_opts)?;
        print!("{}", package_tree(&outcome.resolve, &manifest.name, args.depth));
        return Ok(());
    }

    match args.format {
        TreeFormat::Dot => {
            println!("{}", TargetGraph::from_manifest(&manifest).to_dot());
        }
        TreeFormat::Text => {
            let tree_opts = TreeOptions {
                depth: args.depth,
                target: args.target,
            };
            print!("{}", target_tree(&manifest, &tree_opts)?);
        }
    }

    Ok(())
}
