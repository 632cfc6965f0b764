//! Discovery commands for populating the configuration
//!
//! Read-only lookups: iteration ids for the `iteration_map` table, and
//! project ids for `project.id`.

use clap::Args;
use transplant_core::{Config, RepoRef};
use transplant_github::GitHubClient;

/// Print the project's iteration titles and ids
pub async fn run_iterations(config: &Config) -> anyhow::Result<()> {
    let project_id = config.require_project()?;

    let client =
        GitHubClient::new(&config.dest.repo_ref())?.with_pacing(config.pacing.clone());

    let iterations = client.project_iterations(project_id).await;

    if iterations.is_empty() {
        println!("No iterations found.");
        return Ok(());
    }

    println!("Iterations for project {}:", project_id);
    let mut entries: Vec<_> = iterations.into_iter().collect();
    entries.sort();
    for (title, id) in entries {
        println!("  {:<20} {}", title, id);
    }
    println!();
    println!("Map source to destination ids under [project.iteration_map] in the config file.");

    Ok(())
}

/// Arguments for the repository project listing
#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Repository to inspect (owner/repo); defaults to the destination
    #[arg(long)]
    pub repo: Option<String>,
}

impl ProjectsArgs {
    /// Execute the project listing
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let repo = match &self.repo {
            Some(repo) => repo.parse::<RepoRef>()?,
            None => config.dest.repo_ref(),
        };

        let client = GitHubClient::new(&repo)?.with_pacing(config.pacing.clone());

        let projects = client.repository_projects().await;

        if projects.is_empty() {
            println!("No projects found for {}.", repo);
            return Ok(());
        }

        println!("Projects for {}:", repo);
        for project in projects {
            println!("  {:<30} {}", project.title, project.id);
        }

        Ok(())
    }
}
