use crate::errors::{ProvisionError, Result};
use crate::github::poll::{wait_for_branch, wait_for_commit_sha, PollPolicy};
use crate::github::{BranchRef, CollaboratorInvitation, GitHubApi, Permission, RepoDescriptor, RepoId};

pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Knobs shared by every repository a provisioner creates.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub template: RepoId,
    pub owner: String,
    pub private: bool,
    pub permission: Permission,
    /// Overrides the default branch GitHub reports for the generated repo.
    pub base_branch: Option<String>,
    pub branch_prefix: String,
    pub branch_ready: PollPolicy,
    pub commit_ready: PollPolicy,
}

impl ProvisionSettings {
    pub fn new(template: RepoId, owner: impl Into<String>) -> Self {
        Self {
            template,
            owner: owner.into(),
            private: true,
            permission: Permission::Push,
            base_branch: None,
            branch_prefix: "branch-".to_string(),
            branch_ready: PollPolicy::BRANCH_READY,
            commit_ready: PollPolicy::COMMIT_READY,
        }
    }

    pub fn student_branch(&self, student: &str) -> String {
        format!("{}{}", self.branch_prefix, student)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned {
    pub repo: RepoId,
    pub html_url: String,
    pub student: String,
    pub branch: BranchRef,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub provisioned: Vec<Provisioned>,
    pub failed: Vec<(String, ProvisionError)>,
}

impl BatchReport {
    pub fn links(&self) -> Vec<String> {
        self.provisioned.iter().map(|p| p.html_url.clone()).collect()
    }
}

pub struct Provisioner<T: GitHubApi> {
    pub api: T,
    pub settings: ProvisionSettings,
}

impl<T: GitHubApi> Provisioner<T> {
    pub fn new(api: T, settings: ProvisionSettings) -> Self {
        Self { api, settings }
    }

    /// Generate `repo_name` from the template, invite `student`, wait for the
    /// base branch and create the student's branch on top of it.
    ///
    /// The first failing step aborts the rest; nothing is rolled back.
    pub fn provision(&self, repo_name: &str, student: &str) -> Result<Provisioned> {
        let settings = &self.settings;
        let descriptor = RepoDescriptor::new(&settings.owner, repo_name, settings.private);
        let repo = descriptor.id();

        log::info!(
            "📦 Creating repo '{}' from template '{}'...",
            repo_name,
            settings.template
        );
        let generated = self
            .api
            .generate_repo(&settings.template, &descriptor)
            .map_err(|e| {
                log::error!("❌ Failed to create repo from template: {}", e);
                e
            })?;
        log::info!("✅ Repo created: {}", generated.html_url);
        log::debug!("generated {}", generated.full_name);

        let invitation = CollaboratorInvitation {
            username: student.to_string(),
            permission: settings.permission,
        };
        log::info!(
            "👥 Inviting {} to {} with {} permission...",
            student,
            repo,
            invitation.permission
        );
        self.api.add_collaborator(&repo, &invitation).map_err(|e| {
            log::error!("❌ Failed to invite {}: {}", student, e);
            e
        })?;
        log::info!("✅ {} invited successfully.", student);

        let base_branch = settings
            .base_branch
            .as_deref()
            .or(generated.default_branch.as_deref())
            .unwrap_or(DEFAULT_BASE_BRANCH);

        wait_for_branch(&self.api, &repo, base_branch, settings.branch_ready).map_err(|e| {
            log::error!("❌ {}", e);
            e
        })?;

        let branch = self.create_student_branch(&repo, base_branch, student)?;

        Ok(Provisioned {
            repo,
            html_url: generated.html_url,
            student: student.to_string(),
            branch,
        })
    }

    fn create_student_branch(&self, repo: &RepoId, base_branch: &str, student: &str) -> Result<BranchRef> {
        let sha = wait_for_commit_sha(&self.api, repo, base_branch, self.settings.commit_ready)
            .map_err(|e| {
                log::error!("❌ Failed to retrieve base branch SHA: {}", e);
                e
            })?;

        let new_branch = self.settings.student_branch(student);
        match self.api.create_branch_ref(repo, &new_branch, &sha) {
            Ok(branch) => {
                log::info!("✅ Branch '{}' created successfully.", branch.name);
                Ok(branch)
            }
            Err(e) => {
                log::error!("❌ Failed to create branch '{}': {}", new_branch, e);
                Err(e)
            }
        }
    }

    /// Provision one repository per student, named `{base_name}_{suffix}`.
    ///
    /// A failing student is recorded and skipped; the batch carries on.
    pub fn provision_batch(&self, base_name: &str, students: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for student in students {
            let repo_name = unique_repo_name(base_name);
            match self.provision(&repo_name, student) {
                Ok(provisioned) => report.provisioned.push(provisioned),
                Err(e) => {
                    log::warn!("⚠️  Skipping {}: {}", student, e);
                    report.failed.push((student.clone(), e));
                }
            }
        }

        report
    }
}

/// `base` followed by an underscore and six random hex characters.
pub fn unique_repo_name(base: &str) -> String {
    let suffix: [u8; 3] = rand::random();
    format!("{}_{}", base, hex::encode(suffix))
}
