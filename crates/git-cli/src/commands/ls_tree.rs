use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Args;
use git_hash::ObjectId;
use git_object::ObjectType;
use git_odb::ObjectStore;

use super::{open_repo, parse_oid};
use crate::Cli;

#[derive(Args)]
pub struct LsTreeArgs {
    /// Recurse into sub-trees
    #[arg(short = 'r')]
    recurse: bool,

    /// Show only names
    #[arg(long)]
    name_only: bool,

    /// Tree or commit to list
    #[arg(value_name = "tree-ish")]
    tree_ish: String,
}

pub fn run(args: &LsTreeArgs, _cli: &Cli) -> Result<i32> {
    let repo = open_repo()?;
    let oid = parse_oid(&args.tree_ish)?;

    let tree = match repo.objects().read_header(&oid)?.0 {
        ObjectType::Tree => oid,
        ObjectType::Commit => repo.objects().read_commit(&oid)?.tree,
        other => bail!("not a tree object: {} is a {other}", args.tree_ish),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    list_tree(repo.objects(), &tree, "", args, &mut out)?;
    Ok(0)
}

fn list_tree(
    store: &ObjectStore,
    oid: &ObjectId,
    prefix: &str,
    args: &LsTreeArgs,
    out: &mut impl Write,
) -> Result<()> {
    for entry in store.read_tree(oid)?.iter() {
        let path = format!("{prefix}{}", entry.name);
        if args.recurse && entry.mode.is_tree() {
            list_tree(store, &entry.oid, &format!("{path}/"), args, out)?;
            continue;
        }
        if args.name_only {
            writeln!(out, "{path}")?;
        } else {
            let kind = if entry.mode.is_tree() { "tree" } else { "blob" };
            writeln!(out, "{:06o} {kind} {}\t{path}", entry.mode.raw(), entry.oid)?;
        }
    }
    Ok(())
}
