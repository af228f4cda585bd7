use crate::errors::{ProvisionError, Result};
use crate::github::{Permission, ProvisionSettings, RepoId, DEFAULT_API_URL};
use serde::Deserialize;
use std::path::Path;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Contents of the JSON config file.
///
/// The capitalised aliases keep older `config.json` files working.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default, alias = "Personal_access_token")]
    pub token: Option<String>,
    #[serde(alias = "Github_Username")]
    pub owner: String,
    #[serde(alias = "TEMPLATE_OWNER")]
    pub template_owner: String,
    #[serde(alias = "repo_to_fork")]
    pub template_repo: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub base_branch: Option<String>,
    #[serde(default = "default_private")]
    pub private: bool,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_private() -> bool {
    true
}

fn default_branch_prefix() -> String {
    "branch-".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            log::error!("Cannot read config file {}: {}", path.display(), e);
            e
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("owner", &self.owner),
            ("template_owner", &self.template_owner),
            ("template_repo", &self.template_repo),
            ("api_url", &self.api_url),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ProvisionError::Config(format!("'{}' must not be empty", key)));
            }
        }
        if self.template_repo.contains('/') {
            return Err(ProvisionError::Config(
                "'template_repo' is the repository name only, not owner/name".to_string(),
            ));
        }
        Ok(())
    }

    /// The token from `GITHUB_TOKEN`, falling back to the config file.
    pub fn resolve_token(&self) -> Result<String> {
        let from_env = std::env::var(TOKEN_ENV).ok();
        pick_token(from_env, self.token.clone())
    }

    pub fn settings(&self) -> ProvisionSettings {
        let mut settings = ProvisionSettings::new(
            RepoId::new(&self.template_owner, &self.template_repo),
            &self.owner,
        );
        settings.private = self.private;
        settings.permission = self.permission;
        settings.base_branch = self.base_branch.clone();
        settings.branch_prefix = self.branch_prefix.clone();
        settings
    }
}

fn pick_token(from_env: Option<String>, from_file: Option<String>) -> Result<String> {
    from_env
        .into_iter()
        .chain(from_file)
        .find(|token| !token.trim().is_empty())
        .ok_or_else(|| {
            ProvisionError::Config(format!(
                "no GitHub token: set 'token' in the config file or {}",
                TOKEN_ENV
            ))
        })
}
