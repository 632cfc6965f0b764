//! GitHub API client
//!
//! One client per repository side. The octocrab instance covers the REST
//! surface; the same token is reused for raw GraphQL POSTs (see
//! `graphql.rs`).

use octocrab::Octocrab;
use tracing::info;
use transplant_core::{PacingConfig, RepoRef, Secrets};

use crate::{Error, Result};

/// GitHub API client bound to one repository
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    pacing: PacingConfig,
}

impl GitHubClient {
    /// Create a client for the given repository
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_TOKEN environment variable
    /// 2. ~/.config/transplant/secrets.toml
    pub fn new(repo: &RepoRef) -> Result<Self> {
        let secrets = Secrets::load().map_err(|e| Error::Auth(e.to_string()))?;

        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN or add the token to \
                 ~/.config/transplant/secrets.toml"
                    .to_string(),
            )
        })?;

        let client = Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(owner = %repo.owner, repo = %repo.repo, "Created GitHub client");

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            token,
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            pacing: PacingConfig::default(),
        })
    }

    /// Replace the default rate-limit backoff policy
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub(crate) fn client(&self) -> &Octocrab {
        &self.client
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
