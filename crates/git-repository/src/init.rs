use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::RepoError;

const CONFIG: &str = "[core]\n\trepositoryformatversion = 0\n\tbare = false\n";
const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

/// Create the `.git` skeleton under `work_tree`:
/// - HEAD (pointing at `default_branch`)
/// - config
/// - description
/// - objects/
/// - refs/heads/
/// - refs/tags/
///
/// Running it on an existing repository changes nothing. Returns the
/// absolute git directory.
pub(crate) fn init_repository(work_tree: &Path, default_branch: &str) -> Result<PathBuf, RepoError> {
    let work_tree = if work_tree.is_relative() {
        std::env::current_dir()?.join(work_tree)
    } else {
        work_tree.to_path_buf()
    };
    let git_dir = work_tree.join(".git");

    if git_dir.join("HEAD").is_file() {
        debug!(git_dir = %git_dir.display(), "reinitializing existing repository");
        return Ok(git_dir);
    }

    fs::create_dir_all(git_dir.join("objects"))?;
    fs::create_dir_all(git_dir.join("refs").join("heads"))?;
    fs::create_dir_all(git_dir.join("refs").join("tags"))?;

    fs::write(
        git_dir.join("HEAD"),
        format!("ref: refs/heads/{default_branch}\n"),
    )?;
    fs::write(git_dir.join("config"), CONFIG)?;
    fs::write(git_dir.join("description"), DESCRIPTION)?;

    info!(git_dir = %git_dir.display(), "initialized empty repository");
    Ok(git_dir)
}
