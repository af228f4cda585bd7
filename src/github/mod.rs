pub mod api;
pub mod poll;
pub mod provisioner;
pub mod types;


pub use api::{GitHubApi, HttpGitHubApi, DEFAULT_API_URL};
#[cfg(test)]
pub use api::{MockGitHubApi, BASE_SHA};
pub use poll::PollPolicy;
pub use provisioner::{ProvisionSettings, Provisioner};
pub use types::{BranchRef, CollaboratorInvitation, Permission, RepoDescriptor, RepoId};
