use serde::{Deserialize, Serialize};
use std::fmt;

/// `owner/name` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Body of a "generate repository from template" request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub owner: String,
    pub name: String,
    pub private: bool,
    pub include_all_branches: bool,
}

impl RepoDescriptor {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, private: bool) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            private,
            include_all_branches: false,
        }
    }

    pub fn id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.name)
    }
}

/// The subset of the generation response we care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedRepo {
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Pull,
    Triage,
    #[default]
    Push,
    Maintain,
    Admin,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Pull => "pull",
            Permission::Triage => "triage",
            Permission::Push => "push",
            Permission::Maintain => "maintain",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorInvitation {
    pub username: String,
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
pub(crate) struct InvitationPayload {
    pub permission: Permission,
}

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub sha: String,
}

/// Wire shape of `GET /git/ref/...` and `POST /git/refs` responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub object: GitObject,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GitObject {
    pub sha: String,
}

impl From<GitRef> for BranchRef {
    fn from(git_ref: GitRef) -> Self {
        let name = git_ref
            .reference
            .strip_prefix("refs/heads/")
            .unwrap_or(&git_ref.reference)
            .to_string();
        BranchRef {
            name,
            sha: git_ref.object.sha,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRefPayload<'a> {
    #[serde(rename = "ref")]
    pub reference: String,
    pub sha: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
}
