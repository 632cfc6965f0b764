//! Pull request copy command

use clap::Args;
use transplant_core::Config;
use transplant_github::{copy_prs, GitHubClient, PrCopyOptions};

use super::print_report;

/// Arguments for the PR copy job
#[derive(Args, Debug)]
pub struct PrsArgs {
    /// Also copy each PR's labels and assignees
    #[arg(long)]
    pub with_metadata: bool,

    /// Log what would be copied without creating anything
    #[arg(long)]
    pub dry_run: bool,
}

impl PrsArgs {
    /// Execute the PR copy job
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        config.require_repos()?;

        let source = GitHubClient::new(&config.source)?.with_pacing(config.pacing.clone());
        let dest =
            GitHubClient::new(&config.dest.repo_ref())?.with_pacing(config.pacing.clone());

        println!(
            "Copying pull requests from {} to {}...",
            config.source,
            config.dest.repo_ref()
        );

        let options = PrCopyOptions {
            default_base: config.dest.default_base.clone(),
            with_metadata: self.with_metadata,
            dry_run: self.dry_run,
        };

        let report = copy_prs(&source, &dest, &options).await;
        print_report(&report);

        Ok(())
    }
}
