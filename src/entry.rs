//! Log-entry assembly.
//!
//! Combines an experiment's config document, scalar metrics, and
//! workspace metadata into the documents the store persists: one run
//! record, one metric record per series, and the (unsupported) artifact
//! placeholder. Mirrors what a Sacred observer would produce, which is
//! why run documents carry the `PseudoSacred` format tag.

use std::path::Path;

use anyhow::Result;
use bson::oid::ObjectId;
use bson::Document;

use crate::git_info::{scan_git, Vcs};
use crate::models::{
    ArtifactPlaceholder, ExperimentInfo, MetricBundle, MetricLink, MetricRecord, RunRecord,
};
use crate::requirements::parse_requirements;

/// The three documents assembled for one push.
#[derive(Debug, Clone)]
pub struct LogEntries {
    pub run: RunRecord,
    pub metrics: Vec<MetricRecord>,
    /// Always the empty placeholder; artifact storage is not supported.
    pub artifacts: ArtifactPlaceholder,
}

/// Assemble the documents for one run.
///
/// Each metric series becomes a [`MetricRecord`] with a fresh object id
/// and `run_id = id`; the run document links to them by name and id in
/// the same order. An empty bundle is valid and yields empty record and
/// link lists.
///
/// Workspace metadata is collected fresh on every call: a directory
/// outside any working tree contributes an empty repository list, and a
/// `None` requirements file an empty dependency list. A requirements path
/// that was supplied but does not exist is an error.
pub fn make_log_entries(
    vcs: &dyn Vcs,
    id: i64,
    name: &str,
    config: Document,
    metrics: &MetricBundle,
    git_parent_dir: &Path,
    requirements_file: Option<&Path>,
) -> Result<LogEntries> {
    let repositories = match scan_git(vcs, git_parent_dir)? {
        Some(info) => vec![info],
        None => Vec::new(),
    };
    let dependencies = match requirements_file {
        Some(path) => parse_requirements(path)?,
        None => Vec::new(),
    };
    let experiment = ExperimentInfo {
        name: name.to_string(),
        repositories,
        dependencies,
    };

    let mut metric_records = Vec::with_capacity(metrics.len());
    let mut links = Vec::with_capacity(metrics.len());
    for (metric, series) in metrics {
        let metric_id = ObjectId::new();
        metric_records.push(MetricRecord {
            id: metric_id,
            run_id: id,
            name: metric.clone(),
            steps: series.steps.clone(),
            timestamps: series
                .timestamps
                .iter()
                .map(|ts| bson::DateTime::from_chrono(*ts))
                .collect(),
            values: series.values.clone(),
        });
        links.push(MetricLink {
            name: metric.clone(),
            id: metric_id.to_hex(),
        });
    }

    let run = RunRecord::new(id, config, experiment, links);

    Ok(LogEntries {
        run,
        metrics: metric_records,
        artifacts: ArtifactPlaceholder,
    })
}
