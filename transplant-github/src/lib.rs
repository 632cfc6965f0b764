//! GitHub access for transplant
//!
//! REST reads and writes (issues, pull requests, branches, labels,
//! assignees) go through octocrab; everything ProjectV2 (field schemas,
//! item field values, mutations) goes through the GraphQL endpoint. The
//! batch jobs in [`copy`] tie the two together.

mod client;
mod copy;
mod create;
mod error;
mod fields;
mod graphql;
mod issues;
mod pr;
mod projects;
mod replay;

pub use client::GitHubClient;
pub use copy::{copy_issues, copy_prs, CopyReport, IssueCopyOptions, PrCopyOptions};
pub use error::{Error, Result};
pub use fields::{
    FieldKind, FieldSchema, FieldValue, Iteration, ItemFieldValues, ProjectField,
};
pub use issues::{Issue, IssueState};
pub use pr::{resolve_base_branch, PrState, PullRequest};
pub use projects::ProjectRef;
pub use replay::{plan_updates, resolve_update, FieldUpdate, PlannedUpdate};
