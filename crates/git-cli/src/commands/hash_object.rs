use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::ObjectType;

use super::open_repo;
use crate::Cli;

#[derive(Args)]
pub struct HashObjectArgs {
    /// Read the object from stdin
    #[arg(long)]
    stdin: bool,

    /// Actually write the object into the object database
    #[arg(short = 'w')]
    write: bool,

    /// Object type
    #[arg(short = 't', default_value = "blob")]
    obj_type: ObjectType,

    /// Files to hash
    #[arg(value_name = "file")]
    files: Vec<PathBuf>,
}

pub fn run(args: &HashObjectArgs, _cli: &Cli) -> Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // A repository is only needed when writing.
    let repo = if args.write { Some(open_repo()?) } else { None };
    let hash = |data: &[u8]| -> Result<ObjectId> {
        Ok(match &repo {
            Some(repo) => repo.write(args.obj_type, data)?,
            None => Hasher::hash_object(args.obj_type.as_str(), data)?,
        })
    };

    if args.stdin {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        writeln!(out, "{}", hash(&data)?)?;
    }
    for file in &args.files {
        let data = std::fs::read(file)
            .with_context(|| format!("could not open '{}' for reading", file.display()))?;
        writeln!(out, "{}", hash(&data)?)?;
    }
    Ok(0)
}
