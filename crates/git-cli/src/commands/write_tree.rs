use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use git_repository::UnreadablePolicy;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct WriteTreeArgs {
    /// Record unreadable files with the null id instead of failing
    #[arg(long)]
    missing_ok: bool,
}

pub fn run(args: &WriteTreeArgs, _cli: &Cli) -> Result<i32> {
    let repo = open_repo()?;
    let oid = if args.missing_ok {
        git_repository::TreeBuilder::new(repo.objects(), UnreadablePolicy::SubstituteNull)
            .build(repo.work_tree())?
    } else {
        repo.write_tree()?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{oid}")?;
    Ok(0)
}
