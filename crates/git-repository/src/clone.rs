//! Clone over smart HTTP.
//!
//! discover refs → fetch one pack with every advertised id → unpack into
//! the object store → write branch refs and `HEAD` → check out `HEAD`.

use std::fs;
use std::path::Path;

use git_protocol::{discover, fetch_pack, RefAdvertisement};
use git_ref::RefName;
use git_transport::Transport;
use tracing::{info, warn};

use crate::{RepoConfig, RepoError, Repository};

/// Clone `url` into `target`, which must be absent or an empty directory.
pub fn clone(url: &str, target: &Path, config: RepoConfig) -> Result<Repository, RepoError> {
    check_target(target)?;
    let transport = git_transport::connect(url, &config.user_agent)?;
    clone_with_transport(&transport, target, config)
}

/// Clone from an already opened transport.
pub fn clone_with_transport<T: Transport + ?Sized>(
    transport: &T,
    target: &Path,
    config: RepoConfig,
) -> Result<Repository, RepoError> {
    check_target(target)?;
    let repo = Repository::init_with(target, config)?;

    let adv = discover(transport)?;
    if adv.is_empty() {
        warn!("remote repository is empty");
        return Ok(repo);
    }

    let pack = fetch_pack(transport, &adv.wants(), &repo.config.user_agent)?;
    let stats = git_odb::unpack_pack(&repo.objects, pack.stream()?)?;
    info!(
        objects = stats.objects,
        deltas = stats.deltas,
        deferred = stats.deferred,
        "unpacked objects"
    );

    let branches = write_branches(&repo, &adv)?;
    point_head(&repo, &adv, &branches)?;

    if let Some(head) = repo.head_oid()? {
        let commit = repo.objects.read_commit(&head)?;
        let checkout = repo.checkout_tree(&commit.tree)?;
        info!(%head, files = checkout.files, "checked out HEAD");
    }
    Ok(repo)
}

fn check_target(target: &Path) -> Result<(), RepoError> {
    match fs::read_dir(target) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                return Err(RepoError::AlreadyExists(target.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(_) if target.exists() => Err(RepoError::AlreadyExists(target.to_path_buf())),
        Err(e) => Err(e.into()),
    }
}

fn write_branches(repo: &Repository, adv: &RefAdvertisement) -> Result<Vec<RefName>, RepoError> {
    let mut written = Vec::new();
    for r in adv.branches() {
        let name = match RefName::new(r.name.clone()) {
            Ok(name) => name,
            Err(e) => {
                warn!(name = %r.name, error = %e, "skipping advertised ref");
                continue;
            }
        };
        repo.refs.write_ref(&name, &r.target)?;
        written.push(name);
    }
    Ok(written)
}

/// Use the advertised `symref=HEAD:` target; otherwise the branch whose
/// tip equals `HEAD` (preferring the default branch); otherwise detach.
fn point_head(
    repo: &Repository,
    adv: &RefAdvertisement,
    branches: &[RefName],
) -> Result<(), RepoError> {
    if let Some(target) = adv.head_symref() {
        if let Some(name) = branches.iter().find(|b| b.as_str() == target) {
            repo.refs.set_head(name)?;
            return Ok(());
        }
        warn!(symref = target, "HEAD points at a branch that was not advertised");
    }

    let Some(head) = adv.head else {
        // No HEAD advertised: stay on the default branch when the remote
        // has it, otherwise leave HEAD unborn.
        return Ok(());
    };

    let tip_of = |name: &RefName| {
        adv.branches()
            .any(|r| r.name == name.as_str() && r.target == head)
    };
    let default = RefName::branch(&repo.config.default_branch)?;
    let chosen = if branches.contains(&default) && tip_of(&default) {
        Some(&default)
    } else {
        branches.iter().find(|b| tip_of(*b))
    };

    match chosen {
        Some(name) => repo.refs.set_head(name)?,
        None => repo.refs.set_head_detached(&head)?,
    }
    Ok(())
}
