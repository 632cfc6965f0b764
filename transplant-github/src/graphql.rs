//! GraphQL transport for the ProjectV2 API
//!
//! octocrab covers the REST surface; project boards only exist behind
//! GraphQL, so those queries and mutations are raw POSTs. Rate-limited
//! responses (403/429) are retried with a doubling delay up to the
//! configured attempt limit; every other failure surfaces immediately.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::{Error, GitHubClient, Result};

const GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL-level error entry
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

/// Delay before the given retry attempt (1-based), doubling each time
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.pow(attempt.saturating_sub(1))
}

impl GitHubClient {
    /// Execute a GraphQL query or mutation
    pub(crate) async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let mut attempt = 0u32;
        let response = loop {
            let response = self
                .http()
                .post(GRAPHQL_URL)
                .header("Authorization", format!("Bearer {}", self.token()))
                .header("User-Agent", "transplant")
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::Graphql(format!("request failed: {}", e)))?;

            let status = response.status();
            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt >= self.pacing().retry_limit {
                    return Err(Error::RateLimited(attempt));
                }
                let delay = backoff_delay(self.pacing().retry_base, attempt);
                warn!(
                    %status,
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read response".to_string());
                return Err(Error::Graphql(format!("status {}: {}", status, text)));
            }

            break response;
        };

        let parsed: GraphQLResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("invalid GraphQL response: {}", e)))?;

        if let Some(errors) = parsed.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Graphql(messages.join(", ")));
        }

        parsed
            .data
            .ok_or_else(|| Error::Graphql("response missing data".to_string()))
    }
}
