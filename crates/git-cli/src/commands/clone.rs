use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use git_repository::RepoConfig;
use git_transport::GitUrl;
use tracing::info;

use crate::Cli;

#[derive(Args)]
pub struct CloneArgs {
    /// Be quiet, only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Repository URL (http:// or https://)
    repository: String,

    /// Destination directory
    dest_dir: Option<PathBuf>,
}

pub fn run(args: &CloneArgs, _cli: &Cli) -> Result<i32> {
    let dest = match &args.dest_dir {
        Some(d) => d.clone(),
        None => {
            let url = GitUrl::parse(&args.repository)?;
            let name = url
                .humanish_name()
                .context("could not guess a directory name; please specify one")?;
            PathBuf::from(name)
        }
    };

    if !args.quiet {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        writeln!(err, "Cloning into '{}'...", dest.display())?;
    }

    let repo = git_repository::clone(&args.repository, &dest, RepoConfig::from_env()?)
        .with_context(|| format!("clone of '{}' failed", args.repository))?;

    info!(git_dir = %repo.git_dir().display(), "clone complete");
    if !args.quiet && repo.head_oid()?.is_none() {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        writeln!(err, "warning: You appear to have cloned an empty repository.")?;
    }
    Ok(0)
}
