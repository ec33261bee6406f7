use std::io::{self, Read, Write};

use anyhow::Result;
use clap::Args;

use super::{open_repo, parse_oid};
use crate::Cli;

#[derive(Args)]
pub struct CommitTreeArgs {
    /// Tree object ID
    tree: String,

    /// Parent commit
    #[arg(short = 'p')]
    parent: Option<String>,

    /// Commit message (read from stdin when absent)
    #[arg(short = 'm')]
    message: Option<String>,
}

pub fn run(args: &CommitTreeArgs, _cli: &Cli) -> Result<i32> {
    let repo = open_repo()?;
    let tree = parse_oid(&args.tree)?;
    let parent = args.parent.as_deref().map(parse_oid).transpose()?;

    let message = match &args.message {
        Some(msg) => msg.clone(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let oid = repo.commit(&tree, parent.as_ref(), &message)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{oid}")?;
    Ok(0)
}
