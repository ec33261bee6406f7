use bstr::BString;
use git_hash::ObjectId;
use git_object::{Commit, ObjectType};
use git_odb::OdbError;
use tracing::info;

use crate::{RepoError, Repository};

impl Repository {
    /// Store a commit of `tree` with an optional parent and return its id.
    ///
    /// Author and committer come from the configuration. A trailing
    /// newline is added to `message` if it has none. Refs are not touched.
    pub fn commit(
        &self,
        tree: &ObjectId,
        parent: Option<&ObjectId>,
        message: &str,
    ) -> Result<ObjectId, RepoError> {
        self.expect_kind(tree, ObjectType::Tree)?;
        if let Some(parent) = parent {
            self.expect_kind(parent, ObjectType::Commit)?;
        }

        let mut message = BString::from(message);
        if !message.ends_with(b"\n") {
            message.push(b'\n');
        }
        let commit = Commit {
            tree: *tree,
            parents: parent.into_iter().copied().collect(),
            author: self.config.author.signature(),
            committer: self.config.committer.signature(),
            extra_headers: Vec::new(),
            message,
        };
        let oid = self
            .objects
            .write(ObjectType::Commit, &commit.serialize_content())?;
        info!(%oid, %tree, summary = %commit.summary(), "created commit");
        Ok(oid)
    }

    /// Commit `tree` on top of `HEAD` and advance the branch `HEAD` points
    /// at (or `HEAD` itself when detached).
    pub fn commit_and_update_head(
        &self,
        tree: &ObjectId,
        message: &str,
    ) -> Result<ObjectId, RepoError> {
        let parent = self.head_oid()?;
        let oid = self.commit(tree, parent.as_ref(), message)?;
        let updated = self.refs.update_head(&oid)?;
        info!(%oid, updated_ref = %updated, "updated ref");
        Ok(oid)
    }

    fn expect_kind(&self, oid: &ObjectId, expected: ObjectType) -> Result<(), RepoError> {
        let (actual, _) = self.objects.read_header(oid)?;
        if actual != expected {
            return Err(OdbError::UnexpectedKind {
                oid: *oid,
                expected,
                actual,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Identity, RepoConfig};
    use git_object::GitDate;

    fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let date = GitDate::new(1700000000, 60);
        let config = RepoConfig {
            author: Identity::new("A U Thor", "author@example.com").with_date(date),
            committer: Identity::new("C O Mitter", "committer@example.com").with_date(date),
            ..RepoConfig::default()
        };
        let repo = Repository::init_with(dir.path(), config).unwrap();
        (dir, repo)
    }

    #[test]
    fn commit_wire_format() {
        let (_dir, repo) = repo();
        let tree = repo.write(ObjectType::Tree, b"").unwrap();
        let oid = repo.commit(&tree, None, "initial").unwrap();

        let raw = repo.read(&oid).unwrap();
        assert_eq!(raw.kind, ObjectType::Commit);
        assert_eq!(
            String::from_utf8(raw.data).unwrap(),
            "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
             author A U Thor <author@example.com> 1700000000 +0100\n\
             committer C O Mitter <committer@example.com> 1700000000 +0100\n\
             \n\
             initial\n"
        );
    }

    #[test]
    fn parent_and_head_update() {
        let (_dir, repo) = repo();
        let tree = repo.write(ObjectType::Tree, b"").unwrap();

        let first = repo.commit_and_update_head(&tree, "one\n").unwrap();
        assert_eq!(repo.head_oid().unwrap(), Some(first));

        let second = repo.commit_and_update_head(&tree, "two").unwrap();
        let commit = repo.objects().read_commit(&second).unwrap();
        assert_eq!(commit.parents, vec![first]);
        assert_eq!(commit.message, "two\n");
        assert_eq!(
            std::fs::read_to_string(repo.git_dir().join("refs/heads/main")).unwrap(),
            format!("{second}\n")
        );
    }

    #[test]
    fn tree_argument_must_be_a_tree() {
        let (_dir, repo) = repo();
        let blob = repo.write(ObjectType::Blob, b"x").unwrap();
        assert!(matches!(
            repo.commit(&blob, None, "m"),
            Err(RepoError::Odb(OdbError::UnexpectedKind { .. }))
        ));
        let tree = repo.write(ObjectType::Tree, b"").unwrap();
        let missing = ObjectId::new([1; 20]);
        assert_eq!(
            repo.commit(&tree, Some(&missing), "m").unwrap_err().kind(),
            crate::ErrorKind::NotFound
        );
    }
}
