pub mod cat_file;
pub mod clone;
pub mod commit_tree;
pub mod hash_object;
pub mod init;
pub mod ls_tree;
pub mod write_tree;

use anyhow::{Context, Result};
use clap::Subcommand;
use git_hash::ObjectId;
use git_repository::Repository;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty repository or reinitialize an existing one
    Init(init::InitArgs),
    /// Provide content or type and size information for repository objects
    CatFile(cat_file::CatFileArgs),
    /// Compute object ID and optionally create an object from a file
    HashObject(hash_object::HashObjectArgs),
    /// List the contents of a tree object
    LsTree(ls_tree::LsTreeArgs),
    /// Store the working tree as tree objects and print the root id
    WriteTree(write_tree::WriteTreeArgs),
    /// Create a new commit object
    CommitTree(commit_tree::CommitTreeArgs),
    /// Clone a repository over smart HTTP into a new directory
    Clone(clone::CloneArgs),
}

pub fn open_repo() -> Result<Repository> {
    Repository::discover(".").context("not a minigit repository (or any of the parent directories)")
}

/// Parse a full 40-character hex object id.
pub fn parse_oid(arg: &str) -> Result<ObjectId> {
    ObjectId::from_hex(arg).with_context(|| format!("not a valid object name: {arg}"))
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Init(args) => init::run(args, &cli),
        Commands::CatFile(args) => cat_file::run(args, &cli),
        Commands::HashObject(args) => hash_object::run(args, &cli),
        Commands::LsTree(args) => ls_tree::run(args, &cli),
        Commands::WriteTree(args) => write_tree::run(args, &cli),
        Commands::CommitTree(args) => commit_tree::run(args, &cli),
        Commands::Clone(args) => clone::run(args, &cli),
    }
}
