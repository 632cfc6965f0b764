//! Batch copy jobs
//!
//! Each job is one sequential pass over the source listing. Per-item
//! failures are logged, recorded in the report, and the loop moves on;
//! nothing is retried or rolled back.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::pr::resolve_base_branch;
use crate::replay::{plan_updates, FieldUpdate};
use crate::GitHubClient;

/// Options for the issue copy job
#[derive(Debug, Clone, Default)]
pub struct IssueCopyOptions {
    /// ProjectV2 node id shared by the source and destination items
    pub project_id: String,
    /// Source iteration id to destination iteration id
    pub iteration_map: HashMap<String, String>,
    /// Log what would happen without creating anything
    pub dry_run: bool,
}

/// Options for the PR copy job
#[derive(Debug, Clone, Default)]
pub struct PrCopyOptions {
    /// Base branch substituted when the source base is absent downstream
    pub default_base: String,
    /// Propagate labels and assignees onto the created PRs
    pub with_metadata: bool,
    /// Log what would happen without creating anything
    pub dry_run: bool,
}

/// Outcome of a copy job
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Items created in the destination repository
    pub created: usize,
    /// Items not created (dry run)
    pub skipped: usize,
    /// Per-item failures, in processing order
    pub errors: Vec<String>,
}

/// Copy all issues from `source` to `dest`, replaying project field values
///
/// Pipeline per issue: read its field values from the source project,
/// create the destination issue, attach it to the project, then replay
/// every field value that resolves against the destination schema.
pub async fn copy_issues(
    source: &GitHubClient,
    dest: &GitHubClient,
    options: &IssueCopyOptions,
) -> CopyReport {
    let mut report = CopyReport::default();

    let issues = source.list_all_issues().await;
    if issues.is_empty() {
        info!("No issues found");
        return report;
    }

    // Source and destination share one project, so its schema is fetched
    // once and reused for every issue.
    let schema = dest.project_fields(&options.project_id).await;

    for issue in &issues {
        let source_values = source.issue_field_values(issue.number).await;

        if options.dry_run {
            info!(
                number = issue.number,
                title = %issue.title,
                fields = source_values.len(),
                "[DRY RUN] Would copy issue"
            );
            report.skipped += 1;
            continue;
        }

        let node_id = match dest
            .create_issue(&issue.title, &issue.body, &issue.labels, &issue.assignees)
            .await
        {
            Ok(node_id) => node_id,
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to create issue");
                report
                    .errors
                    .push(format!("issue #{} ({}): {}", issue.number, issue.title, e));
                continue;
            }
        };
        report.created += 1;

        let item_id = match dest.add_item_to_project(&options.project_id, &node_id).await {
            Ok(item_id) => item_id,
            Err(e) => {
                warn!(number = issue.number, error = %e, "Failed to add issue to project");
                report
                    .errors
                    .push(format!("issue #{}: project attach: {}", issue.number, e));
                continue;
            }
        };

        for planned in plan_updates(&schema, &source_values, &options.iteration_map) {
            // Only single-select updates are short-circuited against the
            // current value; iteration updates are re-issued unconditionally.
            if let FieldUpdate::SingleSelectOption(target) = &planned.update {
                let current = dest.current_field_value(&item_id, &planned.field_id).await;
                if current.as_deref() == Some(target.as_str()) {
                    info!(
                        number = issue.number,
                        field = %planned.field_name,
                        "Field already holds the target value, skipping update"
                    );
                    continue;
                }
            }

            match dest
                .update_item_field(
                    &options.project_id,
                    &item_id,
                    &planned.field_id,
                    &planned.update,
                )
                .await
            {
                Ok(()) => {
                    info!(
                        number = issue.number,
                        field = %planned.field_name,
                        "Replayed field value"
                    );
                }
                Err(e) => {
                    warn!(
                        number = issue.number,
                        field = %planned.field_name,
                        error = %e,
                        "Failed to update field"
                    );
                    report.errors.push(format!(
                        "issue #{}: field '{}': {}",
                        issue.number, planned.field_name, e
                    ));
                }
            }
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Issue copy finished"
    );

    report
}

/// Copy all pull requests from `source` to `dest`
///
/// Head and base refs come from the single-PR endpoint rather than the
/// listing; the base falls back to `options.default_base` when the branch
/// does not exist downstream.
pub async fn copy_prs(
    source: &GitHubClient,
    dest: &GitHubClient,
    options: &PrCopyOptions,
) -> CopyReport {
    let mut report = CopyReport::default();

    let prs = source.list_all_prs().await;
    if prs.is_empty() {
        info!("No pull requests found");
        return report;
    }

    for pr in &prs {
        let details = match source.get_pr(pr.number).await {
            Ok(details) => details,
            Err(e) => {
                warn!(number = pr.number, error = %e, "Failed to fetch PR details, skipping");
                report
                    .errors
                    .push(format!("PR #{} ({}): {}", pr.number, pr.title, e));
                continue;
            }
        };

        let branches = dest.list_branches().await;
        let base = resolve_base_branch(&details.base_branch, &branches, &options.default_base);

        if options.dry_run {
            info!(
                number = pr.number,
                head = %details.head_branch,
                %base,
                "[DRY RUN] Would copy pull request"
            );
            report.skipped += 1;
            continue;
        }

        let new_number = match dest
            .create_pull_request(&pr.title, &pr.body, &details.head_branch, &base)
            .await
        {
            Ok(number) => number,
            Err(e) => {
                warn!(number = pr.number, error = %e, "Failed to create pull request");
                report
                    .errors
                    .push(format!("PR #{} ({}): {}", pr.number, pr.title, e));
                continue;
            }
        };
        report.created += 1;

        if options.with_metadata {
            propagate_pr_metadata(source, dest, pr.number, new_number, &mut report).await;
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Pull request copy finished"
    );

    report
}

/// Copy labels and assignees from a source PR onto a freshly created one
///
/// Both travel through the issue-compatible endpoint. The two attach calls
/// are independent; one failing does not block the other.
async fn propagate_pr_metadata(
    source: &GitHubClient,
    dest: &GitHubClient,
    source_number: u64,
    dest_number: u64,
    report: &mut CopyReport,
) {
    let issue = match source.get_issue(source_number).await {
        Ok(issue) => issue,
        Err(e) => {
            warn!(number = source_number, error = %e, "Failed to fetch PR metadata");
            report
                .errors
                .push(format!("PR #{}: metadata fetch: {}", source_number, e));
            return;
        }
    };

    if let Err(e) = dest.add_labels(dest_number, &issue.labels).await {
        warn!(number = dest_number, error = %e, "Failed to add labels");
        report
            .errors
            .push(format!("PR #{}: labels: {}", dest_number, e));
    }

    if let Err(e) = dest.add_assignees(dest_number, &issue.assignees).await {
        warn!(number = dest_number, error = %e, "Failed to add assignees");
        report
            .errors
            .push(format!("PR #{}: assignees: {}", dest_number, e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_default() {
        let report = CopyReport::default();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_options_default() {
        let options = PrCopyOptions::default();
        assert!(!options.with_metadata);
        assert!(!options.dry_run);
    }
}
