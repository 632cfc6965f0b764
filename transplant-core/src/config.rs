//! Configuration for copy jobs
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags (and their `TRANSPLANT_*` environment equivalents)
//! 2. Config file (~/.config/transplant/config.toml)
//! 3. Default values
//!
//! The loaded value is passed into each job as-is; nothing reads global
//! state after startup.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Repository coordinates in `owner/repo` form
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// True when either coordinate is missing
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty() || self.repo.is_empty()
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(owner), Some(repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(Error::Config(format!(
                "Invalid repository '{}'. Expected owner/repo",
                s
            ))),
        }
    }
}

/// Destination repository plus its base-branch fallback
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DestConfig {
    pub owner: String,
    pub repo: String,

    /// Base branch substituted when a source PR's base branch does not exist
    /// in the destination repository
    pub default_base: String,
}

impl Default for DestConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            default_base: "main".to_string(),
        }
    }
}

impl DestConfig {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner, &self.repo)
    }
}

/// The ProjectV2 board issues are attached to
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// ProjectV2 node id (`PVT_...`), shared by source and destination items
    pub id: String,

    /// Source iteration id to destination iteration id. Maintained by hand
    /// from `transplant iterations` output; ids with no entry are skipped
    /// during replay, never defaulted.
    pub iteration_map: HashMap<String, String>,
}

/// Backoff policy for rate-limited GraphQL calls
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay before the first retry; doubles on each subsequent one
    #[serde(with = "humantime_serde")]
    pub retry_base: Duration,

    /// Total attempts before a rate-limited call is given up
    pub retry_limit: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            retry_base: Duration::from_secs(2),
            retry_limit: 3,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Repository items are read from
    pub source: RepoRef,

    /// Repository items are created in
    pub dest: DestConfig,

    /// Project board configuration
    pub project: ProjectConfig,

    /// Rate-limit backoff configuration
    pub pacing: PacingConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/transplant/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("transplant").join("config.toml"))
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        source: Option<RepoRef>,
        dest: Option<RepoRef>,
        project: Option<String>,
    ) -> Self {
        if let Some(source) = source {
            self.source = source;
        }

        if let Some(dest) = dest {
            self.dest.owner = dest.owner;
            self.dest.repo = dest.repo;
        }

        if let Some(project) = project {
            self.project.id = project;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > config file > defaults
    pub fn load_with_overrides(
        path: Option<&Path>,
        source: Option<RepoRef>,
        dest: Option<RepoRef>,
        project: Option<String>,
    ) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(config.with_cli_overrides(source, dest, project))
    }

    /// Both repositories must be configured before a copy job can start
    pub fn require_repos(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(Error::Config(
                "source repository not configured (set [source] in the config file or pass --source)"
                    .to_string(),
            ));
        }

        if self.dest.repo_ref().is_empty() {
            return Err(Error::Config(
                "destination repository not configured (set [dest] in the config file or pass --dest)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// The ProjectV2 node id, required by the issue job and discovery
    pub fn require_project(&self) -> Result<&str> {
        if self.project.id.is_empty() {
            return Err(Error::Config(
                "project.id not configured (find it with `transplant projects`)".to_string(),
            ));
        }

        Ok(&self.project.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.source.is_empty());
        assert!(config.dest.repo_ref().is_empty());
        assert_eq!(config.dest.default_base, "main");
        assert!(config.project.id.is_empty());
        assert_eq!(config.pacing.retry_base, Duration::from_secs(2));
        assert_eq!(config.pacing.retry_limit, 3);
    }

    #[test]
    fn test_repo_ref_parse() {
        let r: RepoRef = "octocat/hello-world".parse().unwrap();
        assert_eq!(r.owner, "octocat");
        assert_eq!(r.repo, "hello-world");
        assert_eq!(r.to_string(), "octocat/hello-world");
    }

    #[test]
    fn test_repo_ref_parse_invalid() {
        assert!("no-slash".parse::<RepoRef>().is_err());
        assert!("/repo".parse::<RepoRef>().is_err());
        assert!("owner/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[source]
owner = "furmidgeuk"
repo = "nn-databricks"

[dest]
owner = "furmidgeuk"
repo = "nndcp-docs"
default_base = "develop"

[project]
id = "PVT_kwDOCaCuvc4Azlr2"

[project.iteration_map]
"ea0f6749" = "7f367449"
"792d2d4e" = "2e7ffa25"

[pacing]
retry_base = "5s"
retry_limit = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.source, RepoRef::new("furmidgeuk", "nn-databricks"));
        assert_eq!(config.dest.repo, "nndcp-docs");
        assert_eq!(config.dest.default_base, "develop");
        assert_eq!(config.project.id, "PVT_kwDOCaCuvc4Azlr2");
        assert_eq!(
            config.project.iteration_map.get("ea0f6749").map(String::as_str),
            Some("7f367449")
        );
        assert_eq!(config.pacing.retry_base, Duration::from_secs(5));
        assert_eq!(config.pacing.retry_limit, 4);
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[source]
owner = "octocat"
repo = "a"

[dest]
owner = "octocat"
repo = "b"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // Unspecified sections fall back to defaults
        assert_eq!(config.dest.default_base, "main");
        assert!(config.project.iteration_map.is_empty());
        assert_eq!(config.pacing.retry_limit, 3);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some(RepoRef::new("a", "b")),
            Some(RepoRef::new("c", "d")),
            Some("PVT_x".to_string()),
        );

        assert_eq!(config.source, RepoRef::new("a", "b"));
        assert_eq!(config.dest.repo_ref(), RepoRef::new("c", "d"));
        // default_base survives a dest override
        assert_eq!(config.dest.default_base, "main");
        assert_eq!(config.project.id, "PVT_x");
    }

    #[test]
    fn test_require_repos() {
        let mut config = Config::default();
        assert!(config.require_repos().is_err());

        config.source = RepoRef::new("a", "b");
        assert!(config.require_repos().is_err());

        config.dest.owner = "c".to_string();
        config.dest.repo = "d".to_string();
        assert!(config.require_repos().is_ok());
    }

    #[test]
    fn test_require_project() {
        let mut config = Config::default();
        assert!(config.require_project().is_err());

        config.project.id = "PVT_x".to_string();
        assert_eq!(config.require_project().unwrap(), "PVT_x");
    }
}
