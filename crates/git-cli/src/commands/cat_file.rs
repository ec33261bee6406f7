use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::Args;
use git_object::{ObjectType, RawObject, Tree};

use super::{open_repo, parse_oid};
use crate::Cli;

#[derive(Args)]
pub struct CatFileArgs {
    /// Show object type
    #[arg(short = 't', conflicts_with_all = ["size", "pretty"])]
    type_only: bool,

    /// Show object size
    #[arg(short = 's', conflicts_with_all = ["type_only", "pretty"])]
    size: bool,

    /// Pretty-print the object content
    #[arg(short = 'p', conflicts_with_all = ["type_only", "size"])]
    pretty: bool,

    /// Either <object> (with -t/-s/-p) or <type> <object>
    #[arg(value_name = "arg", required = true, num_args = 1..=2)]
    positional: Vec<String>,
}

pub fn run(args: &CatFileArgs, _cli: &Cli) -> Result<i32> {
    let repo = open_repo()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let flagged = args.type_only || args.size || args.pretty;
    let (expected, object) = match args.positional.as_slice() {
        [object] if flagged => (None, object),
        [kind, object] if !flagged => (Some(kind.parse::<ObjectType>()?), object),
        _ => bail!("usage: cat-file (-t | -s | -p | <type>) <object>"),
    };
    let oid = parse_oid(object)?;

    if args.type_only || args.size {
        let (kind, size) = repo.objects().read_header(&oid)?;
        if args.type_only {
            writeln!(out, "{kind}")?;
        } else {
            writeln!(out, "{size}")?;
        }
        return Ok(0);
    }

    let obj = repo.read(&oid)?;
    if let Some(expected) = expected {
        if obj.kind != expected {
            bail!("{oid}: expected {expected} but found {}", obj.kind);
        }
        out.write_all(&obj.data)?;
        return Ok(0);
    }
    pretty_print(&obj, &mut out)?;
    Ok(0)
}

fn pretty_print(obj: &RawObject, out: &mut impl Write) -> Result<()> {
    match obj.kind {
        ObjectType::Tree => {
            for entry in Tree::parse(&obj.data)?.iter() {
                let kind = if entry.mode.is_tree() {
                    "tree"
                } else if entry.mode.raw() == 0o160000 {
                    "commit"
                } else {
                    "blob"
                };
                write!(out, "{:06o} {kind} {}\t", entry.mode.raw(), entry.oid)?;
                out.write_all(&entry.name)?;
                writeln!(out)?;
            }
        }
        ObjectType::Blob | ObjectType::Commit | ObjectType::Tag => out.write_all(&obj.data)?,
    }
    Ok(())
}
