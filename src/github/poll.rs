use crate::errors::{ProvisionError, Result};
use crate::github::{BranchRef, GitHubApi, RepoId};
use std::thread;
use std::time::Duration;

/// Fixed attempt budget with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    /// Waiting for a freshly generated repository's default branch.
    pub const BRANCH_READY: PollPolicy = PollPolicy::new(15, Duration::from_secs(4));

    /// Waiting for the commit behind a visible ref to become readable.
    pub const COMMIT_READY: PollPolicy = PollPolicy::new(20, Duration::from_secs(2));

    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/// Run `attempt` until it yields a value or the budget runs out.
///
/// `attempt` returns `Ok(None)` for "not ready yet"; any `Err` aborts the
/// loop immediately. The pause happens between attempts only.
pub fn poll_until<T, F>(policy: PollPolicy, what: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Result<Option<T>>,
{
    for n in 1..=policy.attempts {
        if let Some(value) = attempt(n)? {
            return Ok(value);
        }
        if n < policy.attempts {
            thread::sleep(policy.interval);
        }
    }

    Err(ProvisionError::Timeout {
        what: what.to_string(),
        attempts: policy.attempts,
    })
}

/// Folds "not ready" failures into `Ok(None)` and keeps everything else.
fn ready<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_ready() => {
            log::debug!("not ready: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Poll the ref of `branch` until GitHub answers with 2xx.
pub fn wait_for_branch<T: GitHubApi>(
    api: &T,
    repo: &RepoId,
    branch: &str,
    policy: PollPolicy,
) -> Result<BranchRef> {
    log::info!("⏳ Waiting for {} branch of {} to be ready...", branch, repo);

    let what = format!("branch '{}' of {}", branch, repo);
    let branch_ref = poll_until(policy, &what, |n| {
        log::debug!("ref attempt {}/{} for {}", n, policy.attempts, what);
        ready(api.get_branch_ref(repo, branch))
    })?;

    log::info!("✅ Branch '{}' is ready.", branch);
    Ok(branch_ref)
}

/// Resolve the SHA of `branch`, making sure the commit itself is readable.
///
/// A ref can be visible before the commit it points at, so each attempt
/// reads the ref and then the commit. The SHA is only returned when both
/// reads succeed in the same attempt.
pub fn wait_for_commit_sha<T: GitHubApi>(
    api: &T,
    repo: &RepoId,
    branch: &str,
    policy: PollPolicy,
) -> Result<String> {
    let what = format!("commit behind '{}' of {}", branch, repo);
    let sha = poll_until(policy, &what, |_| {
        let Some(branch_ref) = ready(api.get_branch_ref(repo, branch))? else {
            log::info!("⏳ Waiting for base branch '{}' to be ready...", branch);
            return Ok(None);
        };

        match ready(api.get_commit(repo, &branch_ref.sha))? {
            Some(commit) => Ok(Some(commit.sha)),
            None => {
                log::info!(
                    "⏳ Waiting for commit object for SHA {} to be ready...",
                    branch_ref.sha
                );
                Ok(None)
            }
        }
    })?;

    log::info!("✅ Base branch '{}' SHA is ready: {}", branch, sha);
    Ok(sha)
}
