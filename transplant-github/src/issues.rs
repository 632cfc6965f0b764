//! Issue fetching

use octocrab::models::issues::Issue as OctocrabIssue;
use octocrab::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, GitHubClient, Result};

/// Listing page size, the API maximum
const PAGE_SIZE: u8 = 100;

/// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl From<octocrab::models::IssueState> for IssueState {
    fn from(state: octocrab::models::IssueState) -> Self {
        match state {
            octocrab::models::IssueState::Closed => IssueState::Closed,
            _ => IssueState::Open,
        }
    }
}

/// GitHub issue representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Repository-scoped number
    pub number: u64,
    /// GraphQL global node id, needed to attach the issue to a project
    pub node_id: String,
    /// Issue title
    pub title: String,
    /// Issue body; absent bodies become the empty string
    pub body: String,
    /// Current state (open/closed)
    pub state: IssueState,
    /// Label names
    pub labels: Vec<String>,
    /// Assignee usernames
    pub assignees: Vec<String>,
    /// Pull request link, present when this entry is actually a PR
    pub pull_request_url: Option<String>,
}

impl Issue {
    /// The issues endpoint returns pull requests too; they are identified by
    /// the attached pull request link.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request_url.is_some()
    }
}

impl From<OctocrabIssue> for Issue {
    fn from(issue: OctocrabIssue) -> Self {
        Issue {
            number: issue.number,
            node_id: issue.node_id,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            state: issue.state.into(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
            pull_request_url: issue.pull_request.map(|pr| pr.url.to_string()),
        }
    }
}

impl GitHubClient {
    /// Fetch a single issue by number
    ///
    /// For a pull request number this returns the issue-compatible view,
    /// which carries the PR's labels and assignees.
    pub async fn get_issue(&self, number: u64) -> Result<Issue> {
        debug!(number, "Fetching issue");

        let issue = self
            .client()
            .issues(self.owner(), self.repo())
            .get(number)
            .await
            .map_err(|e| match &e {
                octocrab::Error::GitHub { source, .. } if source.message.contains("Not Found") => {
                    Error::IssueNotFound(number)
                }
                _ => Error::Api(e),
            })?;

        Ok(issue.into())
    }

    /// Fetch every issue, open and closed, excluding pull requests
    ///
    /// Pagination stops at the first empty page. A failed page is logged and
    /// whatever was accumulated so far is returned; nothing is retried.
    pub async fn list_all_issues(&self) -> Vec<Issue> {
        let mut all = Vec::new();
        let mut page_num = 1u32;

        loop {
            let result = self
                .client()
                .issues(self.owner(), self.repo())
                .list()
                .state(params::State::All)
                .per_page(PAGE_SIZE)
                .page(page_num)
                .send()
                .await;

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        page = page_num,
                        error = %e,
                        "Failed to fetch issues page, returning partial listing"
                    );
                    break;
                }
            };

            if page.items.is_empty() {
                break;
            }

            all.extend(
                page.items
                    .into_iter()
                    .map(Issue::from)
                    .filter(|issue| !issue.is_pull_request()),
            );
            page_num += 1;
        }

        info!(count = all.len(), "Fetched issues");

        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: u64, pull_request_url: Option<&str>) -> Issue {
        Issue {
            number,
            node_id: format!("I_{}", number),
            title: format!("Issue {}", number),
            body: String::new(),
            state: IssueState::Open,
            labels: vec![],
            assignees: vec![],
            pull_request_url: pull_request_url.map(String::from),
        }
    }

    #[test]
    fn test_issue_state_conversion() {
        assert_eq!(
            IssueState::from(octocrab::models::IssueState::Open),
            IssueState::Open
        );
        assert_eq!(
            IssueState::from(octocrab::models::IssueState::Closed),
            IssueState::Closed
        );
    }

    #[test]
    fn test_pull_requests_filtered_from_listing() {
        let batch = vec![
            issue(1, None),
            issue(2, Some("https://api.github.com/repos/o/r/pulls/2")),
            issue(3, None),
        ];

        let kept: Vec<u64> = batch
            .into_iter()
            .filter(|i| !i.is_pull_request())
            .map(|i| i.number)
            .collect();

        assert_eq!(kept, vec![1, 3]);
    }
}
