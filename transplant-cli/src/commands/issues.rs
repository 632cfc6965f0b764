//! Issue copy command

use clap::Args;
use transplant_core::Config;
use transplant_github::{copy_issues, GitHubClient, IssueCopyOptions};

use super::print_report;

/// Arguments for the issue copy job
#[derive(Args, Debug)]
pub struct IssuesArgs {
    /// Log what would be copied without creating anything
    #[arg(long)]
    pub dry_run: bool,
}

impl IssuesArgs {
    /// Execute the issue copy job
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        config.require_repos()?;
        let project_id = config.require_project()?.to_string();

        let source = GitHubClient::new(&config.source)?.with_pacing(config.pacing.clone());
        let dest =
            GitHubClient::new(&config.dest.repo_ref())?.with_pacing(config.pacing.clone());

        println!(
            "Copying issues from {} to {}...",
            config.source,
            config.dest.repo_ref()
        );

        let options = IssueCopyOptions {
            project_id,
            iteration_map: config.project.iteration_map.clone(),
            dry_run: self.dry_run,
        };

        let report = copy_issues(&source, &dest, &options).await;
        print_report(&report);

        Ok(())
    }
}
