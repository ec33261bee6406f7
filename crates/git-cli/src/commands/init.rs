use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use git_repository::{RepoConfig, Repository};

use crate::Cli;

#[derive(Args)]
pub struct InitArgs {
    /// Override the name of the initial branch
    #[arg(short = 'b', long, value_name = "branch-name")]
    initial_branch: Option<String>,

    /// Be quiet, only report errors
    #[arg(short, long)]
    quiet: bool,

    /// Directory to create the repository in
    directory: Option<PathBuf>,
}

pub fn run(args: &InitArgs, _cli: &Cli) -> Result<i32> {
    let target = match &args.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let reinit = target.join(".git").join("HEAD").is_file();

    let mut config = RepoConfig::from_env()?;
    if let Some(branch) = &args.initial_branch {
        config.default_branch = branch.clone();
    }
    let repo = Repository::init_with(&target, config)?;

    if !args.quiet {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let verb = if reinit { "Reinitialized existing" } else { "Initialized empty" };
        let git_dir = std::fs::canonicalize(repo.git_dir())?;
        writeln!(out, "{verb} Git repository in {}/", git_dir.display())?;
    }
    Ok(0)
}
