use crate::{
    commands::student_names,
    config::Config,
    errors::Result,
    github::{HttpGitHubApi, Provisioner},
};
use clap::Args;

#[derive(Debug, Args)]
pub struct Provision {
    /// Name of the repository to generate under the configured owner
    #[arg(long)]
    pub repo_name: String,

    /// GitHub username to invite and to create a branch for
    #[arg(long)]
    pub student: String,
}

impl Provision {
    pub fn execute(&self, config: &Config) -> Result<()> {
        let students = student_names(std::slice::from_ref(&self.student))?;
        let api = HttpGitHubApi::new(&config.api_url, &config.resolve_token()?)?;
        let provisioner = Provisioner::new(api, config.settings());

        let provisioned = provisioner.provision(self.repo_name.trim(), &students[0])?;

        println!("{}", provisioned.html_url);
        println!(
            "{}: {} -> {} ({})",
            provisioned.repo, provisioned.student, provisioned.branch.name, provisioned.branch.sha
        );
        Ok(())
    }
}
