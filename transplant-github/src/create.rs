//! Destination-side creation and metadata attachment

use tracing::{debug, info};

use crate::{Error, GitHubClient, Result};

impl GitHubClient {
    /// Create an issue, returning its GraphQL node id
    ///
    /// The node id (not the number) is what the project attachment mutation
    /// needs as content id.
    pub async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
        assignees: &[String],
    ) -> Result<String> {
        debug!(title, "Creating issue");

        let issue = self
            .client()
            .issues(self.owner(), self.repo())
            .create(title)
            .body(body)
            .labels(labels.to_vec())
            .assignees(assignees.to_vec())
            .send()
            .await
            .map_err(Error::Api)?;

        info!(number = issue.number, title, "Created issue");

        Ok(issue.node_id)
    }

    /// Create a pull request, returning the new PR's number
    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<u64> {
        debug!(title, head, base, "Creating pull request");

        let pr = self
            .client()
            .pulls(self.owner(), self.repo())
            .create(title, head, base)
            .body(body)
            .send()
            .await
            .map_err(Error::Api)?;

        info!(number = pr.number, title, "Created pull request");

        Ok(pr.number)
    }

    /// Attach labels to an issue or PR by number
    pub async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }

        self.client()
            .issues(self.owner(), self.repo())
            .add_labels(number, labels)
            .await
            .map_err(Error::Api)?;

        info!(number, count = labels.len(), "Added labels");

        Ok(())
    }

    /// Assign users to an issue or PR by number
    pub async fn add_assignees(&self, number: u64, assignees: &[String]) -> Result<()> {
        if assignees.is_empty() {
            return Ok(());
        }

        let names: Vec<&str> = assignees.iter().map(String::as_str).collect();
        self.client()
            .issues(self.owner(), self.repo())
            .add_assignees(number, &names)
            .await
            .map_err(Error::Api)?;

        info!(number, count = assignees.len(), "Added assignees");

        Ok(())
    }
}
