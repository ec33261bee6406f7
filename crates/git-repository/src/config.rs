use git_object::{GitDate, Signature};

use crate::env::EnvOverrides;
use crate::RepoError;

/// User agent sent to remotes.
pub const DEFAULT_USER_AGENT: &str = concat!("minigit/", env!("CARGO_PKG_VERSION"));

/// What tree building does with a file or subdirectory it cannot read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnreadablePolicy {
    /// Abort the build with [`RepoError::Unreadable`].
    #[default]
    Fail,
    /// Log a warning and record the all-zero id for the entry.
    SubstituteNull,
}

/// Author or committer identity. Without a fixed date the current time is
/// used for every signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub date: Option<GitDate>,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: GitDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn signature(&self) -> Signature {
        Signature::new(
            self.name.as_str(),
            self.email.as_str(),
            self.date.unwrap_or_else(GitDate::now),
        )
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("minigit", "minigit@localhost")
    }
}

/// Settings that shape how a repository reads and writes data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoConfig {
    /// zlib level for new loose objects.
    pub compression_level: u32,
    /// Branch `HEAD` points at after `init`.
    pub default_branch: String,
    pub unreadable: UnreadablePolicy,
    pub user_agent: String,
    pub author: Identity,
    pub committer: Identity,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            compression_level: git_odb::DEFAULT_COMPRESSION_LEVEL,
            default_branch: "main".into(),
            unreadable: UnreadablePolicy::default(),
            user_agent: DEFAULT_USER_AGENT.into(),
            author: Identity::default(),
            committer: Identity::default(),
        }
    }
}

impl RepoConfig {
    /// Defaults with the `GIT_AUTHOR_*`/`GIT_COMMITTER_*` environment
    /// applied.
    pub fn from_env() -> Result<Self, RepoError> {
        let mut config = Self::default();
        EnvOverrides::from_env().apply(&mut config)?;
        Ok(config)
    }
}
