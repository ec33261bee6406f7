use git_object::GitDate;

use crate::config::{Identity, RepoConfig};
use crate::RepoError;

/// Identity overrides read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// GIT_AUTHOR_NAME
    pub author_name: Option<String>,
    /// GIT_AUTHOR_EMAIL
    pub author_email: Option<String>,
    /// GIT_AUTHOR_DATE, raw `<unix-ts> <tz>` form
    pub author_date: Option<String>,
    /// GIT_COMMITTER_NAME
    pub committer_name: Option<String>,
    /// GIT_COMMITTER_EMAIL
    pub committer_email: Option<String>,
    /// GIT_COMMITTER_DATE, raw `<unix-ts> <tz>` form
    pub committer_date: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());
        Self {
            author_name: get("GIT_AUTHOR_NAME"),
            author_email: get("GIT_AUTHOR_EMAIL"),
            author_date: get("GIT_AUTHOR_DATE"),
            committer_name: get("GIT_COMMITTER_NAME"),
            committer_email: get("GIT_COMMITTER_EMAIL"),
            committer_date: get("GIT_COMMITTER_DATE"),
        }
    }

    pub fn apply(&self, config: &mut RepoConfig) -> Result<(), RepoError> {
        apply_identity(
            &mut config.author,
            &self.author_name,
            &self.author_email,
            &self.author_date,
            "GIT_AUTHOR_DATE",
        )?;
        apply_identity(
            &mut config.committer,
            &self.committer_name,
            &self.committer_email,
            &self.committer_date,
            "GIT_COMMITTER_DATE",
        )
    }
}

fn apply_identity(
    identity: &mut Identity,
    name: &Option<String>,
    email: &Option<String>,
    date: &Option<String>,
    date_var: &'static str,
) -> Result<(), RepoError> {
    if let Some(name) = name {
        identity.name = name.clone();
    }
    if let Some(email) = email {
        identity.email = email.clone();
    }
    if let Some(date) = date {
        let parsed = GitDate::parse_raw(date).map_err(|e| RepoError::InvalidEnv {
            var: date_var,
            reason: e.to_string(),
        })?;
        identity.date = Some(parsed);
    }
    Ok(())
}
