use crate::{
    commands::student_names,
    config::Config,
    errors::{ProvisionError, Result},
    github::{HttpGitHubApi, Provisioner},
};
use clap::Args;

#[derive(Debug, Args)]
pub struct Batch {
    /// Prefix of the generated repository names; a random suffix is appended
    #[arg(long)]
    pub base_name: String,

    /// Comma separated GitHub usernames, one repository each
    #[arg(long, value_delimiter = ',', required = true)]
    pub students: Vec<String>,
}

impl Batch {
    pub fn execute(&self, config: &Config) -> Result<()> {
        let students = student_names(&self.students)?;
        let api = HttpGitHubApi::new(&config.api_url, &config.resolve_token()?)?;
        let provisioner = Provisioner::new(api, config.settings());

        let report = provisioner.provision_batch(&self.base_name, &students);

        for link in report.links() {
            println!("{}", link);
        }
        for (student, e) in &report.failed {
            eprintln!("❌ {}: {}", student, e);
        }

        if report.provisioned.is_empty() && !report.failed.is_empty() {
            return Err(ProvisionError::BatchFailed(report.failed.len()));
        }
        Ok(())
    }
}
