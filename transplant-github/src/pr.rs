//! Pull request fetching and branch listing

use octocrab::models::pulls::PullRequest as OctocrabPR;
use octocrab::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{Error, GitHubClient, Result};

const PAGE_SIZE: u8 = 100;

/// PR state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
}

impl From<octocrab::models::IssueState> for PrState {
    fn from(state: octocrab::models::IssueState) -> Self {
        match state {
            octocrab::models::IssueState::Closed => PrState::Closed,
            _ => PrState::Open,
        }
    }
}

/// Pull request representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body; absent bodies become the empty string
    pub body: String,
    /// Current state (open, closed)
    pub state: PrState,
    /// Head branch name
    pub head_branch: String,
    /// Base branch name
    pub base_branch: String,
}

impl From<OctocrabPR> for PullRequest {
    fn from(pr: OctocrabPR) -> Self {
        PullRequest {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            state: pr.state.map(Into::into).unwrap_or(PrState::Open),
            head_branch: pr.head.ref_field,
            base_branch: pr.base.ref_field,
        }
    }
}

/// Substitute the fallback branch when the requested base is absent downstream
pub fn resolve_base_branch(requested: &str, existing: &[String], fallback: &str) -> String {
    if existing.iter().any(|branch| branch == requested) {
        requested.to_string()
    } else {
        warn!(
            requested,
            fallback, "Base branch not found in destination, using fallback"
        );
        fallback.to_string()
    }
}

impl GitHubClient {
    /// Get a pull request by number
    pub async fn get_pr(&self, number: u64) -> Result<PullRequest> {
        debug!(number, "Fetching pull request");

        let pr = self
            .client()
            .pulls(self.owner(), self.repo())
            .get(number)
            .await
            .map_err(|e| match &e {
                octocrab::Error::GitHub { source, .. } if source.message.contains("Not Found") => {
                    Error::PrNotFound(number)
                }
                _ => Error::Api(e),
            })?;

        Ok(pr.into())
    }

    /// Fetch every pull request, open and closed
    ///
    /// Same pagination contract as issue listing: stops at the first empty
    /// page, and a failed page returns the accumulated prefix.
    pub async fn list_all_prs(&self) -> Vec<PullRequest> {
        let mut all = Vec::new();
        let mut page_num = 1u32;

        loop {
            let result = self
                .client()
                .pulls(self.owner(), self.repo())
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
                        "Failed to fetch pull requests page, returning partial listing"
                    );
                    break;
                }
            };

            if page.items.is_empty() {
                break;
            }

            all.extend(page.items.into_iter().map(PullRequest::from));
            page_num += 1;
        }

        info!(count = all.len(), "Fetched pull requests");

        all
    }

    /// Branch names present in this repository
    ///
    /// Errors are logged and yield an empty list, which makes every base
    /// branch fall back downstream.
    pub async fn list_branches(&self) -> Vec<String> {
        let result = self
            .client()
            .repos(self.owner(), self.repo())
            .list_branches()
            .per_page(PAGE_SIZE)
            .send()
            .await;

        match result {
            Ok(page) => page.items.into_iter().map(|b| b.name).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch branches");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_branch_kept_when_present() {
        let branches = vec!["main".to_string(), "develop".to_string()];
        assert_eq!(resolve_base_branch("develop", &branches, "main"), "develop");
    }

    #[test]
    fn test_base_branch_falls_back_when_absent() {
        let branches = vec!["main".to_string()];
        assert_eq!(resolve_base_branch("release", &branches, "main"), "main");
    }

    #[test]
    fn test_base_branch_falls_back_on_empty_listing() {
        assert_eq!(resolve_base_branch("develop", &[], "main"), "main");
    }

    #[test]
    fn test_pr_state_conversion() {
        assert_eq!(
            PrState::from(octocrab::models::IssueState::Open),
            PrState::Open
        );
        assert_eq!(
            PrState::from(octocrab::models::IssueState::Closed),
            PrState::Closed
        );
    }
}
